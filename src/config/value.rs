// src/config/value.rs

//! Tagged configuration values
//!
//! ejudge config files mix quoted strings, bare integers and unquoted
//! literals (`max_vm_size = 256M`). The distinction matters on emission, so
//! values are a closed variant instead of strings with ad-hoc quoting rules.

use std::fmt;

/// A single configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Quoted string (`long_name = "A plus B"`)
    Str(String),
    /// Bare integer (`id = 12`)
    Int(i64),
    /// Boolean, emitted as `1` / `0`
    Bool(bool),
    /// Literal emitted without quoting (`max_vm_size = 256M`)
    Literal(String),
}

impl ConfigValue {
    /// An unquoted literal value
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(s) | Self::Literal(s) => s.parse().ok(),
            Self::Bool(_) => None,
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true) | Self::Int(1))
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        Self::Int(value as i64)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Emission form used in serve.cfg and problem.cfg
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{}\"", escape_quoted(s)),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            Self::Literal(s) => write!(f, "{s}"),
        }
    }
}

fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Parse the value side of a `key = value` line
pub fn parse_value(raw: &str) -> ConfigValue {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return ConfigValue::Str(unescape_quoted(inner));
    }
    if let Ok(i) = raw.parse::<i64>() {
        return ConfigValue::Int(i);
    }
    ConfigValue::Literal(raw.to_string())
}

fn unescape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emission_forms() {
        assert_eq!(ConfigValue::from("A plus B").to_string(), "\"A plus B\"");
        assert_eq!(ConfigValue::from(12i64).to_string(), "12");
        assert_eq!(ConfigValue::from(true).to_string(), "1");
        assert_eq!(ConfigValue::from(false).to_string(), "0");
        assert_eq!(ConfigValue::literal("256M").to_string(), "256M");
    }

    #[test]
    fn quoted_strings_escape_specials() {
        assert_eq!(
            ConfigValue::from("say \"hi\"").to_string(),
            "\"say \\\"hi\\\"\""
        );
    }

    #[test]
    fn parse_round_trips() {
        assert_eq!(parse_value("\"A plus B\""), ConfigValue::Str("A plus B".into()));
        assert_eq!(parse_value("12"), ConfigValue::Int(12));
        assert_eq!(parse_value("256M"), ConfigValue::Literal("256M".into()));
        assert_eq!(
            parse_value("\"say \\\"hi\\\"\""),
            ConfigValue::Str("say \"hi\"".into())
        );
    }
}
