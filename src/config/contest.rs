// src/config/contest.rs

//! Contest configuration (serve.cfg) with snapshot rollback
//!
//! The contest config is loaded once per run, mutated in memory while
//! problems are imported, and written back atomically at the end. A byte
//! snapshot taken at load time is restored verbatim when a problem import
//! fails, so a failed run never leaves a half-merged contest on disk.
//!
//! Sections other than `[problem]` (languages, testers) are carried
//! verbatim; comment lines inside parsed sections are not preserved, only
//! the leading comment block of the file is.

use crate::config::value::{parse_value, ConfigValue};
use crate::config::ProblemConfig;
use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default ejudge contest root; each contest lives in `<root>/<%06d id>`
pub const DEFAULT_EJUDGE_CONTESTS_ROOT: &str = "/home/judges";

/// Locate a contest directory under the ejudge contests root
pub fn contest_dir(root: &Path, contest_id: u32) -> PathBuf {
    root.join(format!("{contest_id:06}"))
}

#[derive(Debug, Clone)]
enum Section {
    Problem(ProblemConfig),
    /// Unrecognized section kept verbatim (header line + raw body lines)
    Raw { header: String, lines: Vec<String> },
}

/// The destination contest's full problem list plus global settings
#[derive(Debug, Clone)]
pub struct ContestConfig {
    path: PathBuf,
    snapshot: Vec<u8>,
    leading_comments: Vec<String>,
    global: ProblemConfig,
    sections: Vec<Section>,
}

impl ContestConfig {
    /// Load and parse serve.cfg from a contest directory
    pub fn load(contest_dir: &Path) -> Result<Self> {
        let path = contest_dir.join("conf").join("serve.cfg");
        let raw = fs::read(&path).map_err(|e| {
            Error::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let text = String::from_utf8_lossy(&raw).into_owned();

        let mut leading_comments = Vec::new();
        let mut global = ProblemConfig::new();
        let mut sections: Vec<Section> = Vec::new();
        let mut in_preamble = true;

        for line in text.lines() {
            let trimmed = line.trim();
            if in_preamble && (trimmed.starts_with('#') || trimmed.is_empty()) {
                leading_comments.push(line.to_string());
                continue;
            }
            in_preamble = false;

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let header = trimmed.trim_matches(['[', ']']).to_string();
                if header == "problem" {
                    sections.push(Section::Problem(ProblemConfig::new()));
                } else {
                    sections.push(Section::Raw {
                        header,
                        lines: Vec::new(),
                    });
                }
                continue;
            }

            match sections.last_mut() {
                None => parse_entry(trimmed, &mut global),
                Some(Section::Problem(cfg)) => parse_entry(trimmed, cfg),
                Some(Section::Raw { lines, .. }) => lines.push(line.to_string()),
            }
        }

        debug!(
            path = %path.display(),
            problems = sections
                .iter()
                .filter(|s| matches!(s, Section::Problem(_)))
                .count(),
            "loaded contest config"
        );

        Ok(Self {
            path,
            snapshot: raw,
            leading_comments,
            global,
            sections,
        })
    }

    /// Raw serve.cfg bytes as they were at load time
    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }

    /// Global setting accessor
    pub fn global(&self, key: &str) -> Option<&ConfigValue> {
        self.global.get(key)
    }

    /// Set a global (pre-section) key
    pub fn set_global(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.global.set(key, value);
    }

    /// Contest scoring mode; a missing key means ACM-style binary accept
    pub fn score_system(&self) -> &str {
        self.global("score_system")
            .and_then(ConfigValue::as_str)
            .unwrap_or("acm")
    }

    /// Iterate the declared problems
    pub fn problems(&self) -> impl Iterator<Item = &ProblemConfig> {
        self.sections.iter().filter_map(|s| match s {
            Section::Problem(cfg) => Some(cfg),
            Section::Raw { .. } => None,
        })
    }

    /// Number of declared problems
    pub fn problem_count(&self) -> usize {
        self.problems().count()
    }

    /// Whether the contest declares the abstract `Generic` template problem
    pub fn has_generic_template(&self) -> bool {
        self.problems()
            .any(|p| p.contains_key("abstract") && p.short_name() == Some("Generic"))
    }

    /// Largest declared numeric problem id
    pub fn max_problem_id(&self) -> i64 {
        self.problems().filter_map(ProblemConfig::id).max().unwrap_or(0)
    }

    /// Short names already taken in this contest
    pub fn short_names(&self) -> Vec<&str> {
        self.problems().filter_map(ProblemConfig::short_name).collect()
    }

    /// Merge a derived problem config into the problem list
    ///
    /// An existing entry with the same id is updated in place (its extra
    /// keys survive); otherwise the config is appended. Re-importing a
    /// problem therefore never duplicates it.
    pub fn upsert_problem(&mut self, config: ProblemConfig) {
        let id = config.id();
        for section in &mut self.sections {
            if let Section::Problem(existing) = section {
                if existing.id().is_some() && existing.id() == id {
                    existing.merge(&config);
                    debug!(id = ?id, "updated existing problem entry");
                    return;
                }
            }
        }
        debug!(id = ?id, "appended new problem entry");
        self.sections.push(Section::Problem(config));
    }

    fn render(&self) -> String {
        let mut out = Vec::new();
        for line in &self.leading_comments {
            writeln!(out, "{line}").expect("write to Vec");
        }
        self.global.write_block(&mut out).expect("write to Vec");
        for section in &self.sections {
            match section {
                Section::Problem(cfg) => {
                    writeln!(out).expect("write to Vec");
                    writeln!(out, "[problem]").expect("write to Vec");
                    cfg.write_block(&mut out).expect("write to Vec");
                }
                Section::Raw { header, lines } => {
                    writeln!(out).expect("write to Vec");
                    writeln!(out, "[{header}]").expect("write to Vec");
                    for line in lines {
                        writeln!(out, "{line}").expect("write to Vec");
                    }
                }
            }
        }
        String::from_utf8(out).expect("config text is UTF-8")
    }

    /// Write the mutated config back atomically (temp file + rename)
    pub fn write(&self) -> Result<()> {
        let rendered = self.render();
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::config("serve.cfg has no parent directory"))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| Error::config(format!("cannot persist serve.cfg: {e}")))?;
        info!(path = %self.path.display(), "wrote contest config");
        Ok(())
    }

    /// Restore the on-disk serve.cfg to its load-time bytes
    pub fn rollback(&self) -> Result<()> {
        fs::write(&self.path, &self.snapshot)?;
        info!(path = %self.path.display(), "rolled back contest config");
        Ok(())
    }
}

fn parse_entry(trimmed: &str, target: &mut ProblemConfig) {
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return;
    }
    match trimmed.split_once('=') {
        Some((key, value)) => target.set(key.trim(), parse_value(value)),
        // A bare key enables a flag (ejudge convention, e.g. `abstract`)
        None => target.set(trimmed, true),
    }
}
