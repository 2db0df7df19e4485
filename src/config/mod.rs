// src/config/mod.rs

//! Ordered problem and contest configuration records

pub mod contest;
pub mod value;

pub use contest::ContestConfig;
pub use value::ConfigValue;

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::io::{self, Write};

/// Header block written at the top of every generated problem.cfg
pub const PROBLEM_CFG_HEADER: &str = "# -*- coding: utf-8 -*-\n[problem]";

/// An insertion-ordered problem configuration record
///
/// Key order is preserved so generated config files are deterministic and
/// diff cleanly across re-imports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemConfig {
    entries: IndexMap<String, ConfigValue>,
}

impl ProblemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, appending it if new, updating in place if present
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a key, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.entries.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge another record into this one, overwriting shared keys
    pub fn merge(&mut self, other: &ProblemConfig) {
        for (key, value) in other.iter() {
            self.set(key, value.clone());
        }
    }

    /// Numeric problem id, if set
    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(ConfigValue::as_int)
    }

    /// Short name, if set
    pub fn short_name(&self) -> Option<&str> {
        self.get("short_name").and_then(ConfigValue::as_str)
    }

    /// Check the stdio/file mutual-exclusivity invariant
    ///
    /// Exactly one of `use_stdin = 1` / `input_file` must hold, and the
    /// same for output. Abstract template problems are exempt.
    pub fn validate_streams(&self) -> Result<()> {
        if self.contains_key("abstract") {
            return Ok(());
        }
        for (flag, file_key) in [("use_stdin", "input_file"), ("use_stdout", "output_file")] {
            let uses_stream = self.get(flag).is_some_and(ConfigValue::is_true);
            let has_file = self.contains_key(file_key);
            if uses_stream == has_file {
                return Err(Error::config(format!(
                    "exactly one of {flag}=1 or {file_key} must be set"
                )));
            }
        }
        Ok(())
    }

    /// Write the entries as `key = value` lines
    pub fn write_block(&self, w: &mut impl Write) -> io::Result<()> {
        for (key, value) in self.iter() {
            writeln!(w, "{key} = {value}")?;
        }
        Ok(())
    }

    /// Render as a standalone problem.cfg document
    pub fn render_problem_cfg(&self) -> String {
        let mut out = Vec::new();
        writeln!(out, "{PROBLEM_CFG_HEADER}").expect("write to Vec");
        self.write_block(&mut out).expect("write to Vec");
        String::from_utf8(out).expect("config text is UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_keep_insertion_order() {
        let mut cfg = ProblemConfig::new();
        cfg.set("id", 3i64);
        cfg.set("short_name", "A");
        cfg.set("time_limit", 2i64);
        cfg.set("id", 4i64); // update must not reorder

        let keys: Vec<&str> = cfg.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["id", "short_name", "time_limit"]);
        assert_eq!(cfg.id(), Some(4));
    }

    #[test]
    fn remove_preserves_remaining_order() {
        let mut cfg = ProblemConfig::new();
        cfg.set("a", 1i64);
        cfg.set("b", 2i64);
        cfg.set("c", 3i64);
        cfg.remove("b");
        let keys: Vec<&str> = cfg.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn stream_invariant_accepts_exactly_one() {
        let mut cfg = ProblemConfig::new();
        cfg.set("use_stdin", true);
        cfg.set("use_stdout", false);
        cfg.set("output_file", "output.txt");
        cfg.validate_streams().unwrap();
    }

    #[test]
    fn stream_invariant_rejects_both() {
        let mut cfg = ProblemConfig::new();
        cfg.set("use_stdin", true);
        cfg.set("input_file", "input.txt");
        cfg.set("use_stdout", true);
        assert!(cfg.validate_streams().is_err());
    }

    #[test]
    fn stream_invariant_rejects_neither() {
        let mut cfg = ProblemConfig::new();
        cfg.set("use_stdin", false);
        cfg.set("use_stdout", true);
        assert!(cfg.validate_streams().is_err());
    }

    #[test]
    fn renders_problem_cfg_with_header() {
        let mut cfg = ProblemConfig::new();
        cfg.set("id", 1i64);
        cfg.set("long_name", "A plus B");
        cfg.set("max_vm_size", ConfigValue::literal("256M"));
        let text = cfg.render_problem_cfg();
        assert_eq!(
            text,
            "# -*- coding: utf-8 -*-\n[problem]\nid = 1\nlong_name = \"A plus B\"\nmax_vm_size = 256M\n"
        );
    }
}
