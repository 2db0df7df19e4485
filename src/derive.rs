// src/derive.rs

//! Derivation of the ejudge problem configuration from package metadata
//!
//! Produces two records: the contest entry merged into serve.cfg and the
//! per-problem record written to problem.cfg (a superset carrying the
//! English name and the package revision). Key order matters for
//! deterministic output and mirrors the generated-file layout.

use crate::config::{ConfigValue, ProblemConfig};
use crate::error::{Error, Result};
use crate::package::PackageMetadata;
use std::path::Path;
use tracing::{debug, warn};

/// Inputs for configuration derivation beyond the metadata itself
pub struct DeriveContext<'a> {
    pub metadata: &'a PackageMetadata,
    pub problem_id: i64,
    pub short_name: &'a str,
    /// Problem directory name under the contest's problems/
    pub internal_name: &'a str,
    pub polygon_id: Option<u32>,
    pub checker_cmd: &'a str,
    pub interactor_cmd: Option<&'a str>,
    pub solution_cmd: &'a str,
    /// Contest declares the abstract Generic template problem
    pub has_generic_template: bool,
    /// Composite statement document was generated
    pub with_statements: bool,
    /// Enable the browser textarea submission form
    pub textarea_input: bool,
}

/// Derived configuration records
pub struct DerivedConfig {
    /// Entry merged into the contest's serve.cfg
    pub contest_entry: ProblemConfig,
    /// Per-problem problem.cfg record (superset of the contest entry)
    pub problem_entry: ProblemConfig,
}

/// Derive the declarative problem configuration
///
/// Any required metadata field missing here is fatal for this problem
/// only; the orchestrator keeps importing the remaining problems.
pub fn derive(ctx: &DeriveContext<'_>) -> Result<DerivedConfig> {
    let meta = ctx.metadata;
    let (long_name, long_name_en) = resolve_names(meta)?;

    let mut config = ProblemConfig::new();
    let mut problem_entry = ProblemConfig::new();

    config.set("id", ctx.problem_id);
    if ctx.has_generic_template {
        config.set("super", "Generic");
    }
    config.set("short_name", ctx.short_name);
    config.set("long_name", long_name);
    problem_entry.set("long_name_en", long_name_en);
    config.set("internal_name", ctx.internal_name);
    if let Some(polygon_id) = ctx.polygon_id {
        config.set("extid", format!("polygon:{polygon_id}"));
    }
    problem_entry.set("revision", meta.revision.as_str());
    if ctx.with_statements {
        config.set("xml_file", "statements.xml");
    }

    match &meta.input_file {
        Some(input_file) => {
            config.set("use_stdin", false);
            config.set("input_file", input_file.as_str());
        }
        None => config.set("use_stdin", true),
    }
    match &meta.output_file {
        Some(output_file) => {
            config.set("use_stdout", false);
            config.set("output_file", output_file.as_str());
        }
        None => config.set("use_stdout", true),
    }

    config.set("test_pat", "%02d");
    config.set("use_corr", true);
    config.set("corr_pat", "%02d.a");

    let time_limit_ms = meta.testset.time_limit_ms;
    if time_limit_ms % 1000 == 0 {
        config.set("time_limit", time_limit_ms / 1000);
    } else {
        config.set("time_limit_millis", time_limit_ms);
    }
    config.set("real_time_limit", real_time_limit_secs(time_limit_ms));

    let memory = memory_size_literal(meta.testset.memory_limit_bytes);
    config.set("max_vm_size", ConfigValue::literal(memory.clone()));
    config.set("max_stack_size", ConfigValue::literal(memory));

    config.set("check_cmd", ctx.checker_cmd);
    if let Some(interactor_cmd) = ctx.interactor_cmd {
        config.set("interactor_cmd", interactor_cmd);
    }
    config.set("solution_cmd", ctx.solution_cmd);

    config.set("enable_testlib_mode", true);
    if ctx.textarea_input {
        config.set("enable_text_form", true);
    }

    config.validate_streams()?;
    debug!(
        id = ctx.problem_id,
        short_name = ctx.short_name,
        "derived problem config"
    );

    problem_entry.merge(&config);
    Ok(DerivedConfig {
        contest_entry: config,
        problem_entry,
    })
}

/// Primary and secondary display names with total fallback
///
/// Russian is preferred for the primary name, English for the secondary;
/// each falls back to the other, and when both are absent any declared
/// name serves for both.
fn resolve_names(meta: &PackageMetadata) -> Result<(String, String)> {
    let russian = meta.name_for("russian");
    let english = meta.name_for("english");
    let (primary, secondary) = match (russian, english) {
        (Some(ru), Some(en)) => (ru, en),
        (Some(ru), None) => (ru, ru),
        (None, Some(en)) => (en, en),
        (None, None) => {
            let any = meta
                .any_name()
                .ok_or_else(|| Error::metadata("no display names declared"))?;
            (any, any)
        }
    };
    Ok((primary.to_string(), secondary.to_string()))
}

/// Smallest exact memory-size unit with an integer coefficient
///
/// The limit arrives in bytes and is always a multiple of 1024 in practice;
/// each tier is taken only when the value divides evenly into the next.
pub fn memory_size_literal(bytes: u64) -> String {
    let kib = bytes / 1024;
    if kib % 1024 != 0 {
        return format!("{kib}K");
    }
    let mib = kib / 1024;
    if mib % 1024 != 0 {
        format!("{mib}M")
    } else {
        format!("{}G", mib / 1024)
    }
}

/// Wall-clock limit: double the CPU limit, floor of five seconds
///
/// Doubling absorbs scheduling jitter; the floor keeps tiny problems from
/// false timeouts.
pub fn real_time_limit_secs(time_limit_ms: u64) -> u64 {
    (time_limit_ms * 2).div_ceil(1000).max(5)
}

/// Apply override directives from the package's description side-file
///
/// Each line either sets a key to an unquoted literal or removes one.
/// Directive parse failures must not abort the import: they are logged and
/// skipped, and a missing file is simply no overrides.
pub fn apply_description_overrides(config: &mut ProblemConfig, problem_dir: &Path) {
    let path = problem_dir.join("documents").join("description.txt");
    let Ok(text) = std::fs::read_to_string(&path) else {
        return;
    };
    debug!(path = %path.display(), "applying description overrides");

    for line in text.lines() {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("source_header") => match words.next() {
                Some(file) => {
                    let full = problem_dir.join(file);
                    config.set("source_header", full.to_string_lossy().into_owned());
                }
                None => warn!("source_header directive without a file name"),
            },
            Some("source_footer") => match words.next() {
                Some(file) => {
                    let full = problem_dir.join(file);
                    config.set("source_footer", full.to_string_lossy().into_owned());
                }
                None => warn!("source_footer directive without a file name"),
            },
            Some("ejudge_config") => match words.next() {
                Some(key) => {
                    // the remainder of the line is the literal value
                    let value = line
                        .splitn(3, ' ')
                        .nth(2)
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    config.set(key, ConfigValue::literal(value));
                }
                None => warn!("ejudge_config directive without a key"),
            },
            Some("ejudge_remove_config") => match words.next() {
                Some(key) => {
                    config.remove(key);
                }
                None => warn!("ejudge_remove_config directive without a key"),
            },
            _ => {}
        }
    }
}
