// src/error.rs

//! Error types for the polyimport pipeline
//!
//! Variants follow the pipeline's failure classes: `Metadata` aborts the
//! current problem (contest config is rolled back), `Statement` aborts the
//! problem during statement conversion, `Converter` failures are downgraded
//! to warnings at the call site and never unwind a problem on their own.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed package metadata (problem.xml)
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Structural statement error (placeholder mismatch, orphan example)
    #[error("statement error: {0}")]
    Statement(String),

    /// Contest or problem configuration error
    #[error("config error: {0}")]
    Config(String),

    /// External converter invocation failed
    #[error("converter error: {0}")]
    Converter(String),

    /// Remote session error (Polygon or ejudge)
    #[error("remote error: {0}")]
    Remote(String),

    /// Invalid command-line argument combination
    #[error("usage error: {0}")]
    Usage(String),

    /// Package archive error
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// XML parse error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    pub fn statement(msg: impl Into<String>) -> Self {
        Self::Statement(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }
}
