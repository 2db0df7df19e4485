// src/lib.rs

//! polyimport
//!
//! Imports Codeforces Polygon problem packages into ejudge contests.
//!
//! # Architecture
//!
//! - Package-first: the Polygon zip is the single source of truth; only the
//!   archive prefixes a step needs are extracted
//! - Derivation, not translation: judge limits, names and I/O modes are
//!   derived from the metadata tree into an ordered, typed config record
//! - Statements: LaTeX fragments are converted per language, assembled via
//!   positional placeholders into the composite statement document, and a
//!   flattened legacy rendering is kept for the older consumer
//! - Transactional merge: the contest config is snapshot at load and
//!   restored byte-for-byte when a problem import fails

pub mod cli;
pub mod commands;
pub mod config;
pub mod convert;
pub mod derive;
mod error;
pub mod package;
pub mod pipeline;
pub mod remote;
pub mod source;
pub mod statement;
pub mod valuer;

pub use config::{ConfigValue, ContestConfig, ProblemConfig};
pub use convert::{CommandConverter, Converter, UnavailableConverter};
pub use derive::{derive, DeriveContext, DerivedConfig};
pub use error::{Error, Result};
pub use package::{PackageMetadata, ProblemPackage};
pub use pipeline::{ContestImportSummary, ImportOptions, ImportReport, ImportState, Pipeline};
pub use source::{ContestPackages, PackageRef};
pub use statement::{compose_statements, StatementConverter, StatementDocument, StatementLang};
pub use valuer::{Gvaluer, ValuerGenerator};
