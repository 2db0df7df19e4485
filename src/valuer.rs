// src/valuer.rs

//! Scoring-policy configuration for non-binary contests
//!
//! When the destination contest scores partial credit, the problem gets a
//! valuer: a judge-side helper that aggregates per-test verdicts into group
//! scores. The pipeline only depends on the [`ValuerGenerator`] seam; the
//! shipped backend targets gvaluer and derives its group table from the
//! testset metadata.

use crate::config::{ConfigValue, ProblemConfig};
use crate::error::Result;
use crate::package::PackageMetadata;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name of the generated valuer policy inside the problem directory
pub const VALUER_CFG: &str = "valuer.cfg";

/// Produces scoring-related configuration entries for one problem
pub trait ValuerGenerator {
    /// Generate scoring config entries and any side files in `problem_dir`
    ///
    /// `no_offline` drops groups judged only after the contest ends.
    fn generate(
        &self,
        metadata: &PackageMetadata,
        no_offline: bool,
        problem_dir: &Path,
    ) -> Result<ProblemConfig>;
}

/// One scoring group derived from the testset
#[derive(Debug, Clone, PartialEq)]
struct Group {
    name: String,
    first_test: usize,
    last_test: usize,
    score: i64,
}

/// The gvaluer backend
#[derive(Debug, Default)]
pub struct Gvaluer;

impl Gvaluer {
    fn groups(metadata: &PackageMetadata, no_offline: bool) -> Vec<Group> {
        let mut groups: Vec<Group> = Vec::new();
        for (index, test) in metadata.testset.tests.iter().enumerate() {
            let test_no = index + 1;
            let name = test.group.clone().unwrap_or_else(|| "0".to_string());
            let points = test.points.unwrap_or(0.0).round() as i64;
            match groups.last_mut() {
                Some(group) if group.name == name => {
                    group.last_test = test_no;
                    group.score += points;
                }
                _ => groups.push(Group {
                    name,
                    first_test: test_no,
                    last_test: test_no,
                    score: points,
                }),
            }
        }
        if no_offline {
            groups.retain(|g| !g.name.starts_with("offline"));
        }
        groups
    }
}

impl ValuerGenerator for Gvaluer {
    fn generate(
        &self,
        metadata: &PackageMetadata,
        no_offline: bool,
        problem_dir: &Path,
    ) -> Result<ProblemConfig> {
        let groups = Self::groups(metadata, no_offline);
        let total_tests = groups.last().map(|g| g.last_test).unwrap_or(0);
        let full_score: i64 = groups.iter().map(|g| g.score).sum();

        let mut policy = String::from("global {\n    stat_to_users;\n}\n");
        for group in &groups {
            write!(
                policy,
                "\ngroup {} {{\n    tests {}-{};\n    score {};\n}}\n",
                group.name, group.first_test, group.last_test, group.score
            )
            .expect("write to String");
        }
        fs::write(problem_dir.join(VALUER_CFG), policy)?;
        debug!(groups = groups.len(), full_score, "generated valuer policy");

        let mut config = ProblemConfig::new();
        config.set("valuer_cmd", "../gvaluer");
        config.set("interactive_valuer", true);
        config.set("full_score", full_score);
        if total_tests > 0 {
            config.set(
                "open_tests",
                ConfigValue::literal(format!("1-{total_tests}:brief")),
            );
            config.set(
                "final_open_tests",
                ConfigValue::literal(format!("1-{total_tests}:full")),
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::metadata::PackageMetadata;
    use tempfile::TempDir;

    fn scored_metadata() -> PackageMetadata {
        PackageMetadata::from_xml(
            r#"<problem revision="1">
              <names><name language="english" value="t"/></names>
              <judging input-file="" output-file="">
                <testset>
                  <time-limit>1000</time-limit>
                  <memory-limit>1048576</memory-limit>
                  <tests>
                    <test points="10" group="1"/>
                    <test points="10" group="1"/>
                    <test points="30" group="2"/>
                    <test points="50" group="offline"/>
                  </tests>
                </testset>
              </judging>
              <assets><checker><source path="files/check.cpp"/></checker></assets>
            </problem>"#,
        )
        .unwrap()
    }

    #[test]
    fn derives_groups_and_scores() {
        let dir = TempDir::new().unwrap();
        let config = Gvaluer
            .generate(&scored_metadata(), false, dir.path())
            .unwrap();
        assert_eq!(config.get("full_score"), Some(&ConfigValue::Int(100)));
        assert_eq!(
            config.get("valuer_cmd"),
            Some(&ConfigValue::Str("../gvaluer".into()))
        );

        let policy = std::fs::read_to_string(dir.path().join(VALUER_CFG)).unwrap();
        assert!(policy.contains("group 1 {\n    tests 1-2;\n    score 20;"));
        assert!(policy.contains("group 2 {\n    tests 3-3;\n    score 30;"));
        assert!(policy.contains("group offline"));
    }

    #[test]
    fn no_offline_drops_offline_groups() {
        let dir = TempDir::new().unwrap();
        let config = Gvaluer
            .generate(&scored_metadata(), true, dir.path())
            .unwrap();
        assert_eq!(config.get("full_score"), Some(&ConfigValue::Int(50)));
        let policy = std::fs::read_to_string(dir.path().join(VALUER_CFG)).unwrap();
        assert!(!policy.contains("offline"));
    }

    #[test]
    fn empty_testset_generates_empty_policy() {
        let dir = TempDir::new().unwrap();
        let meta = PackageMetadata::from_xml(
            r#"<problem revision="1">
              <names><name language="english" value="t"/></names>
              <judging input-file="" output-file="">
                <testset><time-limit>1000</time-limit><memory-limit>1048576</memory-limit></testset>
              </judging>
              <assets><checker><source path="files/check.cpp"/></checker></assets>
            </problem>"#,
        )
        .unwrap();
        let config = Gvaluer.generate(&meta, false, dir.path()).unwrap();
        assert_eq!(config.get("full_score"), Some(&ConfigValue::Int(0)));
        assert!(config.get("open_tests").is_none());
    }
}
