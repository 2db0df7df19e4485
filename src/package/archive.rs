// src/package/archive.rs

//! Selective extraction of Polygon package archives
//!
//! A package is a zip with a fixed layout: `problem.xml` at the top level
//! and `solutions/`, `files/`, `tests/`, `documents/`,
//! `statement-sections/<language>/` prefixes. Only the prefixes a pipeline
//! step needs are materialized; the rest of the archive is never extracted.

use crate::error::{Error, Result};
use crate::package::metadata::PackageMetadata;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Name of the metadata document at the archive root
pub const METADATA_FILE: &str = "problem.xml";

/// An opened problem package archive
pub struct ProblemPackage {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl ProblemPackage {
    /// Open a package archive from disk
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Path of the archive on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extract `problem.xml` into `dest` and parse it
    ///
    /// A missing or malformed metadata document is fatal for the whole
    /// package.
    pub fn extract_metadata(&mut self, dest: &Path) -> Result<PackageMetadata> {
        let mut xml = String::new();
        {
            let mut entry = self.archive.by_name(METADATA_FILE).map_err(|e| {
                Error::metadata(format!(
                    "{} has no {METADATA_FILE}: {e}",
                    self.path.display()
                ))
            })?;
            entry.read_to_string(&mut xml)?;
        }
        fs::write(dest.join(METADATA_FILE), &xml)?;
        PackageMetadata::from_xml(&xml)
    }

    /// Extract every archive entry whose path starts with `prefix` into
    /// `dest`, preserving relative paths
    ///
    /// A no-op when nothing matches. Returns the number of files written.
    pub fn extract_prefix(&mut self, prefix: &str, dest: &Path) -> Result<usize> {
        let mut extracted = 0;
        for index in 0..self.archive.len() {
            let mut entry = self.archive.by_index(index)?;
            if !entry.name().starts_with(prefix) {
                continue;
            }
            if entry.is_dir() {
                continue;
            }
            let Some(relative) = entry.enclosed_name() else {
                warn!("skipping archive entry with unsafe path: {}", entry.name());
                continue;
            };
            let target = dest.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
            extracted += 1;
        }
        debug!(prefix, extracted, "extracted archive prefix");
        Ok(extracted)
    }

    /// Languages that have a `statement-sections/<language>/` prefix
    pub fn statement_section_languages(&mut self) -> Result<Vec<String>> {
        let mut languages = Vec::new();
        for index in 0..self.archive.len() {
            let entry = self.archive.by_index(index)?;
            let Some(rest) = entry.name().strip_prefix("statement-sections/") else {
                continue;
            };
            let Some((language, _)) = rest.split_once('/') else {
                continue;
            };
            if !language.is_empty() && !languages.iter().any(|l| l == language) {
                languages.push(language.to_string());
            }
        }
        languages.sort();
        Ok(languages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_test_package(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("package.zip");
        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        for (name, content) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    const MINIMAL_XML: &str = r#"<problem revision="1">
      <names><name language="english" value="Test"/></names>
      <judging input-file="" output-file="">
        <testset><time-limit>1000</time-limit><memory-limit>1048576</memory-limit></testset>
      </judging>
      <assets>
        <checker><source path="files/check.cpp"/></checker>
      </assets>
    </problem>"#;

    #[test]
    fn extracts_matching_prefix_only() {
        let dir = TempDir::new().unwrap();
        let path = write_test_package(
            dir.path(),
            &[
                ("problem.xml", MINIMAL_XML),
                ("solutions/main.cpp", "int main(){}"),
                ("solutions/wa.cpp", "int main(){return 1;}"),
                ("tests/01", "1 2"),
            ],
        );
        let mut package = ProblemPackage::open(&path).unwrap();
        let dest = TempDir::new().unwrap();
        let count = package.extract_prefix("solutions/", dest.path()).unwrap();
        assert_eq!(count, 2);
        assert!(dest.path().join("solutions/main.cpp").exists());
        assert!(!dest.path().join("tests/01").exists());
    }

    #[test]
    fn extract_prefix_without_matches_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = write_test_package(dir.path(), &[("problem.xml", MINIMAL_XML)]);
        let mut package = ProblemPackage::open(&path).unwrap();
        let dest = TempDir::new().unwrap();
        let count = package.extract_prefix("documents/", dest.path()).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn reads_and_parses_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write_test_package(dir.path(), &[("problem.xml", MINIMAL_XML)]);
        let mut package = ProblemPackage::open(&path).unwrap();
        let dest = TempDir::new().unwrap();
        let meta = package.extract_metadata(dest.path()).unwrap();
        assert_eq!(meta.name_for("english"), Some("Test"));
        assert!(dest.path().join("problem.xml").exists());
    }

    #[test]
    fn missing_metadata_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_test_package(dir.path(), &[("tests/01", "1 2")]);
        let mut package = ProblemPackage::open(&path).unwrap();
        let dest = TempDir::new().unwrap();
        let err = package.extract_metadata(dest.path()).unwrap_err();
        assert!(matches!(err, Error::Metadata(_)));
    }

    #[test]
    fn lists_statement_section_languages() {
        let dir = TempDir::new().unwrap();
        let path = write_test_package(
            dir.path(),
            &[
                ("problem.xml", MINIMAL_XML),
                ("statement-sections/russian/legend.tex", "x"),
                ("statement-sections/russian/input.tex", "x"),
                ("statement-sections/english/legend.tex", "x"),
            ],
        );
        let mut package = ProblemPackage::open(&path).unwrap();
        let languages = package.statement_section_languages().unwrap();
        assert_eq!(languages, vec!["english", "russian"]);
    }
}
