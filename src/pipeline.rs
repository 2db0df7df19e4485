// src/pipeline.rs

//! Per-problem import pipeline and contest-level orchestration
//!
//! One problem moves through a fixed sequence of states; any failure takes
//! it to `Failed`, which restores the contest config to its pre-run
//! snapshot, keeps the partial problem directory on disk for inspection,
//! and re-raises the error. A contest import keeps going after a failed
//! problem so a batch import salvages everything that converts cleanly.

use crate::config::{ConfigValue, ContestConfig};
use crate::convert::Converter;
use crate::derive::{self, DeriveContext};
use crate::error::{Error, Result};
use crate::package::{relocate, ProblemPackage};
use crate::source::PackageRef;
use crate::statement::{
    assets::AssetRewriter, compose_statements, ConvertedStatement, StatementConverter,
    StatementLang,
};
use crate::valuer::ValuerGenerator;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pipeline states of one problem import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Extracting,
    ParsingMetadata,
    RelocatingAssets,
    ConvertingStatements,
    DerivingConfig,
    MergingContestConfig,
    Persisting,
    Done,
    Failed,
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extracting => "extracting",
            Self::ParsingMetadata => "parsing-metadata",
            Self::RelocatingAssets => "relocating-assets",
            Self::ConvertingStatements => "converting-statements",
            Self::DerivingConfig => "deriving-config",
            Self::MergingContestConfig => "merging-contest-config",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Per-problem import options
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Requested short name; allocated automatically when absent or taken
    pub short_name: Option<String>,
    /// Destination problem id; next free id when absent
    pub problem_id: Option<i64>,
    pub polygon_id: Option<u32>,
    /// Ignore offline scoring groups in the valuer
    pub no_offline: bool,
    /// Skip statement conversion entirely
    pub skip_statements: bool,
    /// Keep every declared solution in place instead of quarantining
    pub import_all_solutions: bool,
    /// Enable the browser textarea submission form
    pub textarea_input: bool,
}

/// Outcome of a successful problem import
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub problem_id: i64,
    pub short_name: String,
    pub internal_name: String,
    pub problem_dir: PathBuf,
    /// Solution source files available for post-import smoke submission
    pub solution_sources: Vec<PathBuf>,
}

/// Outcome of a whole-contest import
#[derive(Debug, Default)]
pub struct ContestImportSummary {
    pub imported: Vec<ImportReport>,
    /// (short name or package path, error text) of problems that failed
    pub failed: Vec<(String, String)>,
}

/// The import pipeline with its external collaborators
pub struct Pipeline<'a> {
    latex: &'a dyn Converter,
    raster: &'a dyn Converter,
    valuer: &'a dyn ValuerGenerator,
    /// Location of the gvaluer helper staged into scored contests
    gvaluer_binary: Option<PathBuf>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        latex: &'a dyn Converter,
        raster: &'a dyn Converter,
        valuer: &'a dyn ValuerGenerator,
    ) -> Self {
        Self {
            latex,
            raster,
            valuer,
            gvaluer_binary: which::which("gvaluer").ok(),
        }
    }

    pub fn with_gvaluer_binary(mut self, path: Option<PathBuf>) -> Self {
        self.gvaluer_binary = path;
        self
    }

    /// Import one package into a contest
    ///
    /// The contest config is loaded fresh, mutated in memory, and either
    /// committed or restored byte-for-byte. The problem directory is left
    /// in place on failure.
    pub fn import_problem(
        &self,
        contest_dir: &Path,
        package: &PackageRef,
        options: &ImportOptions,
    ) -> Result<ImportReport> {
        let mut contest = ContestConfig::load(contest_dir)?;

        let problem_id = options
            .problem_id
            .unwrap_or_else(|| contest.max_problem_id() + 1);
        let short_name = allocate_short_name(&contest, options.short_name.as_deref())?;

        let problems_dir = contest_dir.join("problems");
        fs::create_dir_all(&problems_dir)?;
        let internal_name = unique_problem_dir_name(&problems_dir, &package.zip_path)?;
        let problem_dir = problems_dir.join(&internal_name);
        fs::create_dir(&problem_dir)?;

        info!(
            %short_name,
            problem_id,
            %internal_name,
            package = %package.zip_path.display(),
            "importing problem"
        );

        let mut state = ImportState::Extracting;
        match self.run(
            &mut contest,
            &mut state,
            &problems_dir,
            &problem_dir,
            package,
            options,
            problem_id,
            &short_name,
            &internal_name,
        ) {
            Ok(solution_sources) => {
                state = ImportState::Done;
                debug!(%state, %short_name, "problem import finished");
                Ok(ImportReport {
                    problem_id,
                    short_name,
                    internal_name,
                    problem_dir,
                    solution_sources,
                })
            }
            Err(e) => {
                let failed_in = state;
                state = ImportState::Failed;
                warn!(%state, failed_in = %failed_in, %short_name, "problem import failed: {e}");
                // the partial problem directory stays on disk for inspection
                if let Err(rollback_err) = contest.rollback() {
                    warn!("contest config rollback failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        contest: &mut ContestConfig,
        state: &mut ImportState,
        problems_dir: &Path,
        problem_dir: &Path,
        package: &PackageRef,
        options: &ImportOptions,
        problem_id: i64,
        short_name: &str,
        internal_name: &str,
    ) -> Result<Vec<PathBuf>> {
        *state = ImportState::Extracting;
        let mut archive = ProblemPackage::open(&package.zip_path)?;

        *state = ImportState::ParsingMetadata;
        let metadata = archive.extract_metadata(problem_dir)?;

        *state = ImportState::RelocatingAssets;
        archive.extract_prefix("solutions/", problem_dir)?;
        let main_solution = metadata.main_solution()?;
        let solution_cmd = relocate(main_solution, problem_dir)?;
        let mut solution_sources = vec![problem_dir.join(crate::package::flat_name(main_solution)?)];
        let solutions_dir = if options.import_all_solutions {
            problem_dir.join("solutions")
        } else {
            let quarantine = problem_dir.join("solutions1");
            let extracted = problem_dir.join("solutions");
            if extracted.is_dir() {
                fs::rename(&extracted, &quarantine)?;
            }
            quarantine
        };
        if solutions_dir.is_dir() {
            for entry in fs::read_dir(&solutions_dir)? {
                let entry = entry?;
                if entry.path().is_file() {
                    solution_sources.push(entry.path());
                }
            }
        }

        if metadata.has_documents {
            archive.extract_prefix("documents/", problem_dir)?;
        }
        archive.extract_prefix("files/", problem_dir)?;
        let checker_cmd = relocate(&metadata.checker_path, problem_dir)?;
        let interactor_cmd = match &metadata.interactor_path {
            Some(path) => Some(relocate(path, problem_dir)?),
            None => None,
        };
        for resource in &metadata.resources {
            relocate(resource, problem_dir)?;
        }
        archive.extract_prefix("tests/", problem_dir)?;

        *state = ImportState::ConvertingStatements;
        let with_statements = if options.skip_statements {
            false
        } else {
            self.convert_statements(&mut archive, problem_dir)?
        };

        *state = ImportState::DerivingConfig;
        let ctx = DeriveContext {
            metadata: &metadata,
            problem_id,
            short_name,
            internal_name,
            polygon_id: package.polygon_id.or(options.polygon_id),
            checker_cmd: &checker_cmd,
            interactor_cmd: interactor_cmd.as_deref(),
            solution_cmd: &solution_cmd,
            has_generic_template: contest.has_generic_template(),
            with_statements,
            textarea_input: options.textarea_input,
        };
        let mut derived = derive::derive(&ctx)?;

        if !metadata.testset.tests.is_empty() && contest.score_system() != "acm" {
            let valuer_config =
                self.valuer
                    .generate(&metadata, options.no_offline, problem_dir)?;
            derived.contest_entry.merge(&valuer_config);
            contest.set_global("separate_user_score", ConfigValue::Int(1));
            self.stage_gvaluer(problems_dir);
        }
        derive::apply_description_overrides(&mut derived.contest_entry, problem_dir);
        derived.problem_entry.merge(&derived.contest_entry);

        *state = ImportState::MergingContestConfig;
        contest.upsert_problem(derived.contest_entry);

        *state = ImportState::Persisting;
        fs::write(
            problem_dir.join("problem.cfg"),
            derived.problem_entry.render_problem_cfg(),
        )?;
        contest.write()?;
        Ok(solution_sources)
    }

    /// Convert every recognized statement language section
    ///
    /// Returns whether a composite statement document was produced.
    fn convert_statements(
        &self,
        archive: &mut ProblemPackage,
        problem_dir: &Path,
    ) -> Result<bool> {
        archive.extract_prefix("statement-sections", problem_dir)?;
        let sections_dir = problem_dir.join("statement-sections");
        if !sections_dir.is_dir() {
            return Ok(false);
        }

        let mut languages: Vec<(StatementLang, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&sections_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match StatementLang::from_section_dir(&name) {
                Some(lang) => languages.push((lang, entry.path())),
                None => warn!("skipping statement section for unsupported language {name:?}"),
            }
        }
        if languages.is_empty() {
            return Ok(false);
        }
        // primary language first: its legacy blob and assets win
        languages.sort_by_key(|(lang, _)| match lang {
            StatementLang::Russian => 0,
            StatementLang::English => 1,
        });

        let converter = StatementConverter::new(self.latex);
        let mut converted: Vec<(ConvertedStatement, PathBuf)> = Vec::new();
        for (lang, dir) in &languages {
            converted.push((converter.convert_section(dir, *lang)?, dir.clone()));
        }

        if let Some((statement, _)) = converted.iter().find(|(c, _)| !c.legacy.is_empty()) {
            fs::write(problem_dir.join("statements.html"), &statement.legacy)?;
        }

        let documents: Vec<_> = converted
            .iter()
            .map(|(c, _)| c.document.clone())
            .collect();
        let composed = compose_statements(&documents)?;

        let attachments_dir = problem_dir.join("attachments");
        fs::create_dir_all(&attachments_dir)?;
        let (_, primary_section_dir) = &converted[0];
        let rewritten = AssetRewriter::new(self.raster).rewrite(
            &composed,
            primary_section_dir,
            &attachments_dir,
        )?;
        fs::write(problem_dir.join("statements.xml"), rewritten)?;
        Ok(true)
    }

    /// Stage the gvaluer helper next to the contest's problems
    ///
    /// A missing helper is tolerated: the config still references it and
    /// the operator installs it by hand.
    fn stage_gvaluer(&self, problems_dir: &Path) {
        let Some(source) = &self.gvaluer_binary else {
            warn!("gvaluer binary not found; install it into the contest manually");
            return;
        };
        if let Err(e) = fs::copy(source, problems_dir.join("gvaluer")) {
            warn!("cannot stage gvaluer helper: {e}");
        }
    }

    /// Import a whole contest from a package sequence
    ///
    /// Failed problems are recorded and skipped; the remaining packages
    /// are still attempted.
    pub fn import_contest(
        &self,
        contest_dir: &Path,
        packages: impl Iterator<Item = Result<PackageRef>>,
        options: &ImportOptions,
    ) -> Result<ContestImportSummary> {
        let mut summary = ContestImportSummary::default();
        for package in packages {
            let package = match package {
                Ok(package) => package,
                Err(e) => {
                    warn!("skipping package that failed to stage: {e}");
                    summary.failed.push(("<unstaged>".to_string(), e.to_string()));
                    continue;
                }
            };
            let per_problem = ImportOptions {
                short_name: package.short_name.clone(),
                problem_id: None,
                polygon_id: package.polygon_id,
                ..options.clone()
            };
            match self.import_problem(contest_dir, &package, &per_problem) {
                Ok(report) => summary.imported.push(report),
                Err(e) => {
                    let name = package
                        .short_name
                        .clone()
                        .unwrap_or_else(|| package.zip_path.display().to_string());
                    warn!("problem {name} failed: {e}");
                    summary.failed.push((name, e.to_string()));
                }
            }
        }
        info!(
            imported = summary.imported.len(),
            failed = summary.failed.len(),
            "contest import finished"
        );
        Ok(summary)
    }
}

/// Pick a short name: the requested one if free, else the first free
/// letter A..Z, else the first free decimal number
fn allocate_short_name(contest: &ContestConfig, requested: Option<&str>) -> Result<String> {
    let taken = contest.short_names();
    if let Some(name) = requested {
        if !taken.contains(&name) {
            return Ok(name.to_string());
        }
        debug!(name, "requested short name is taken, allocating another");
    }
    for letter in 'A'..='Z' {
        let candidate = letter.to_string();
        if !taken.contains(&candidate.as_str()) {
            return Ok(candidate);
        }
    }
    for number in 0.. {
        let candidate = number.to_string();
        if !taken.contains(&candidate.as_str()) {
            return Ok(candidate);
        }
    }
    unreachable!("the decimal candidate space is unbounded")
}

/// Problem directory name from the package file stem, de-duplicated with a
/// numeric suffix against the existing problems
fn unique_problem_dir_name(problems_dir: &Path, zip_path: &Path) -> Result<String> {
    let stem = zip_path
        .file_name()
        .and_then(|n| n.to_string_lossy().strip_suffix(".zip").map(str::to_string))
        .or_else(|| zip_path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .ok_or_else(|| Error::config("package path has no file name"))?;

    if !problems_dir.join(&stem).exists() {
        return Ok(stem);
    }
    for suffix in 2.. {
        let candidate = format!("{stem}-{suffix}");
        if !problems_dir.join(&candidate).exists() {
            return Ok(candidate);
        }
    }
    unreachable!("the suffix space is unbounded")
}
