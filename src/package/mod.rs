// src/package/mod.rs

//! Polygon package reading: archive extraction, metadata parsing, asset
//! relocation

pub mod archive;
pub mod metadata;
pub mod relocate;

pub use archive::{ProblemPackage, METADATA_FILE};
pub use metadata::{PackageMetadata, ProblemName, SolutionDecl, TestEntry, Testset, XmlNode};
pub use relocate::{flat_name, relocate};
