// src/commands.rs
//! Command handlers for the polyimport CLI

use crate::config::contest::contest_dir;
use crate::convert::{CommandConverter, Converter, UnavailableConverter};
use crate::error::{Error, Result};
use crate::pipeline::{ImportOptions, Pipeline};
use crate::remote::ejudge::DEFAULT_EJUDGE_URL;
use crate::remote::polygon::DEFAULT_POLYGON_URL;
use crate::remote::{auth, EjudgeSession, PolygonSession};
use crate::source::{self, ContestPackages, PackageRef};
use crate::valuer::Gvaluer;
use std::path::{Path, PathBuf};
use tracing::warn;

fn latex_converter() -> Box<dyn Converter> {
    match CommandConverter::pandoc() {
        Ok(converter) => Box::new(converter),
        Err(e) => {
            warn!("statement conversion degraded: {e}");
            Box::new(UnavailableConverter::new(e.to_string()))
        }
    }
}

fn raster_converter() -> Box<dyn Converter> {
    match CommandConverter::imagemagick() {
        Ok(converter) => Box::new(converter),
        Err(e) => {
            warn!("embedded image conversion degraded: {e}");
            Box::new(UnavailableConverter::new(e.to_string()))
        }
    }
}

/// Import a single problem from Polygon or a local package zip
#[allow(clippy::too_many_arguments)]
pub fn cmd_import_problem(
    contests_root: &Path,
    contest_id: u32,
    polygon_problem_id: Option<u32>,
    src_path: Option<PathBuf>,
    short_name: Option<String>,
    ejudge_problem_id: Option<i64>,
    no_offline: bool,
    submit: bool,
    no_lint: bool,
) -> Result<()> {
    let package = if let Some(src_path) = src_path {
        source::stage_local_package(&src_path)?
    } else if let Some(problem_id) = polygon_problem_id {
        let session = PolygonSession::login(DEFAULT_POLYGON_URL)?;
        let staging = source::download_dir(&problem_id.to_string())?;
        let zip_path = session.download_last_package(problem_id, &staging)?;
        PackageRef {
            short_name: None,
            zip_path,
            polygon_id: Some(problem_id),
        }
    } else {
        return Err(Error::Usage(
            "either --problem-id or --src-path must be specified".into(),
        ));
    };

    let latex = latex_converter();
    let raster = raster_converter();
    let valuer = Gvaluer;
    let pipeline = Pipeline::new(latex.as_ref(), raster.as_ref(), &valuer);

    let options = ImportOptions {
        short_name,
        problem_id: ejudge_problem_id,
        polygon_id: polygon_problem_id,
        no_offline,
        ..ImportOptions::default()
    };
    let report = pipeline.import_problem(&contest_dir(contests_root, contest_id), &package, &options)?;
    println!(
        "Imported problem {} (id {}) into contest {} as {}",
        report.short_name, report.problem_id, contest_id, report.internal_name
    );

    if submit {
        let session = EjudgeSession::login(DEFAULT_EJUDGE_URL, contest_id)?;
        for source in &report.solution_sources {
            session.submit_file(source, report.problem_id, no_lint)?;
        }
        println!(
            "Submitted {} solution file(s) for smoke testing",
            report.solution_sources.len()
        );
    }
    Ok(())
}

/// Import a whole contest from Polygon or a local descriptor + zip dir
pub fn cmd_import_contest(
    contests_root: &Path,
    ejudge_id: u32,
    polygon_id: Option<u32>,
    descriptor: Option<PathBuf>,
    src_dir: Option<PathBuf>,
    no_offline: bool,
) -> Result<()> {
    let packages = if let Some(descriptor) = descriptor {
        let src_dir = src_dir.ok_or_else(|| {
            Error::Usage("--descriptor is specified but --src-dir is not".into())
        })?;
        ContestPackages::local(&descriptor, &src_dir)?
    } else if let Some(polygon_id) = polygon_id {
        let session = PolygonSession::login(DEFAULT_POLYGON_URL)?;
        ContestPackages::remote(session, polygon_id)?
    } else {
        return Err(Error::Usage(
            "either --polygon-id or --descriptor must be specified".into(),
        ));
    };

    let latex = latex_converter();
    let raster = raster_converter();
    let valuer = Gvaluer;
    let pipeline = Pipeline::new(latex.as_ref(), raster.as_ref(), &valuer);

    let options = ImportOptions {
        no_offline,
        ..ImportOptions::default()
    };
    let summary = pipeline.import_contest(&contest_dir(contests_root, ejudge_id), packages, &options)?;

    for report in &summary.imported {
        println!(
            "Imported {} (id {}) as {}",
            report.short_name, report.problem_id, report.internal_name
        );
    }
    for (name, error) in &summary.failed {
        println!("Failed {name}: {error}");
    }
    if summary.imported.is_empty() && !summary.failed.is_empty() {
        return Err(Error::config("every problem in the contest failed to import"));
    }
    Ok(())
}

/// Clear cached session credentials for both platforms
pub fn cmd_logout() -> Result<()> {
    auth::clear_all()?;
    println!("Cleared cached Polygon and ejudge credentials");
    Ok(())
}
