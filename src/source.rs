// src/source.rs

//! Package sources for single-problem and whole-contest imports
//!
//! A contest import consumes a lazily-produced, finite sequence of package
//! locations: each element is fetched or staged on demand so a failed
//! download surfaces exactly where the orchestrator can record it and move
//! on. Local packages are staged into a scratch download directory under a
//! normalized name before being opened.

use crate::error::{Error, Result};
use crate::package::XmlNode;
use crate::remote::PolygonSession;
use regex::Regex;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A package ready to be imported
#[derive(Debug, Clone)]
pub struct PackageRef {
    /// Contest index (A, B, ...) when importing a whole contest
    pub short_name: Option<String>,
    pub zip_path: PathBuf,
    pub polygon_id: Option<u32>,
}

/// Scratch directory for staged and downloaded packages
pub fn download_dir(suffix: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("polyimport-{suffix}"));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Locate a problem's package zip in a directory and stage it
///
/// Accepts an exact name, a `name...` prefix, or the versioned
/// `name-N$revision.zip` form; the first match in sorted order wins. The
/// zip is copied into `staging_dir` under the normalized `<name>.zip`.
pub fn find_package_zip(
    problem_name: &str,
    src_dir: &Path,
    staging_dir: &Path,
) -> Result<PathBuf> {
    let versioned = Regex::new(&format!(
        "^{}-\\d+\\$[a-z]*\\.zip$",
        regex::escape(problem_name)
    ))
    .map_err(|e| Error::config(format!("bad problem name pattern: {e}")))?;

    let mut names: Vec<String> = fs::read_dir(src_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let found = names
        .into_iter()
        .find(|name| name.starts_with(problem_name) || versioned.is_match(name))
        .ok_or_else(|| {
            Error::config(format!(
                "package for problem {problem_name:?} not found in {}",
                src_dir.display()
            ))
        })?;

    let staged = staging_dir.join(format!("{problem_name}.zip"));
    if staged.exists() {
        fs::remove_file(&staged)?;
    }
    fs::copy(src_dir.join(&found), &staged)?;
    debug!(package = %found, staged = %staged.display(), "staged package zip");
    Ok(staged)
}

/// Derive a problem name from an explicit package path
///
/// Package files are named `<problem>-<rev>$<flags>.zip`; everything from
/// the version suffix on is dropped.
pub fn problem_name_from_path(src_path: &Path) -> String {
    let file_name = src_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let trimmed = file_name
        .split('$')
        .next()
        .unwrap_or(&file_name);
    match trimmed.rfind('-') {
        Some(dash) => trimmed[..dash].to_string(),
        None => trimmed.to_string(),
    }
}

/// Stage a package given an explicit path to it
pub fn stage_local_package(src_path: &Path) -> Result<PackageRef> {
    let src_path = src_path
        .canonicalize()
        .map_err(|e| Error::config(format!("bad package path {}: {e}", src_path.display())))?;
    let problem_name = problem_name_from_path(&src_path);
    let src_dir = src_path
        .parent()
        .ok_or_else(|| Error::config("package path has no parent directory"))?;
    let staging = download_dir("local")?;
    let zip_path = find_package_zip(&problem_name, src_dir, &staging)?;
    Ok(PackageRef {
        short_name: None,
        zip_path,
        polygon_id: None,
    })
}

/// The lazily-consumed sequence of a contest's packages
pub enum ContestPackages {
    Remote {
        session: PolygonSession,
        staging: PathBuf,
        pending: VecDeque<(String, u32)>,
    },
    Local {
        src_dir: PathBuf,
        staging: PathBuf,
        pending: VecDeque<(String, String)>,
    },
}

impl ContestPackages {
    /// Contest packages fetched from Polygon by contest id
    pub fn remote(session: PolygonSession, polygon_contest_id: u32) -> Result<Self> {
        let problems = session.contest_problems(polygon_contest_id)?;
        let staging = download_dir(&polygon_contest_id.to_string())?;
        info!(
            polygon_contest_id,
            problems = problems.len(),
            "listed remote contest"
        );
        Ok(Self::Remote {
            session,
            staging,
            pending: problems.into_iter().collect(),
        })
    }

    /// Contest packages staged from a local descriptor plus zip directory
    pub fn local(descriptor: &Path, src_dir: &Path) -> Result<Self> {
        let text = fs::read_to_string(descriptor)?;
        let root = XmlNode::parse(&text)?;
        let problems = root
            .child("problems")
            .ok_or_else(|| Error::config("contest descriptor has no <problems>"))?;

        let mut pending = VecDeque::new();
        for problem in problems.children_named("problem") {
            let index = problem
                .attr("index")
                .ok_or_else(|| Error::config("descriptor problem without index"))?;
            let url = problem
                .attr("url")
                .ok_or_else(|| Error::config("descriptor problem without url"))?;
            let name = url
                .trim_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            pending.push_back((index.to_string(), name));
        }
        info!(problems = pending.len(), "parsed contest descriptor");
        Ok(Self::Local {
            src_dir: src_dir.to_path_buf(),
            staging: download_dir("local")?,
            pending,
        })
    }
}

impl Iterator for ContestPackages {
    type Item = Result<PackageRef>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Remote {
                session,
                staging,
                pending,
            } => {
                let (index, problem_id) = pending.pop_front()?;
                let result = session
                    .download_last_package(problem_id, staging)
                    .map(|zip_path| PackageRef {
                        short_name: Some(index),
                        zip_path,
                        polygon_id: Some(problem_id),
                    });
                Some(result)
            }
            Self::Local {
                src_dir,
                staging,
                pending,
            } => {
                let (index, name) = pending.pop_front()?;
                let result =
                    find_package_zip(&name, src_dir, staging).map(|zip_path| PackageRef {
                        short_name: Some(index),
                        zip_path,
                        polygon_id: None,
                    });
                Some(result)
            }
        }
    }
}
