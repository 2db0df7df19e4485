// src/package/relocate.rs

//! Asset relocation from archive-relative paths to the flat problem root
//!
//! Checker, interactor, solution and resource files are declared in the
//! metadata with archive-relative paths (`files/check.cpp`). ejudge invokes
//! them by bare command name from the problem directory, so each asset is
//! copied to the flat working root and addressed by its extension-stripped
//! logical name.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Legacy Delphi project extension remapped to the conventional Pascal one
const LEGACY_PASCAL_EXT: &str = "dpr";
const PASCAL_EXT: &str = "pas";

/// File name an asset gets in the flat working root (after the legacy
/// extension remap)
pub fn flat_name(archive_path: &str) -> Result<String> {
    let file_name = archive_path
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::metadata(format!("asset path has no file name: {archive_path:?}")))?;
    Ok(match file_name.strip_suffix(LEGACY_PASCAL_EXT) {
        Some(stem) => format!("{stem}{PASCAL_EXT}"),
        None => file_name.to_string(),
    })
}

/// Copy an extracted asset into the flat working root and return its
/// logical command name
///
/// `archive_path` is the path as declared in the metadata, relative to
/// `work_dir` (where the archive prefix was extracted). The `dpr` extension
/// is renamed to `pas` on the way. Collisions overwrite silently; callers
/// are responsible for keeping declared asset names distinct.
pub fn relocate(archive_path: &str, work_dir: &Path) -> Result<String> {
    let file_name = archive_path
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::metadata(format!("asset path has no file name: {archive_path:?}")))?;

    let target_name = flat_name(archive_path)?;

    let source = work_dir.join(archive_path);
    let target = work_dir.join(&target_name);
    fs::copy(&source, &target).map_err(|e| {
        Error::metadata(format!(
            "cannot relocate asset {}: {e}",
            source.display()
        ))
    })?;
    debug!(from = archive_path, to = %target_name, "relocated asset");

    let logical = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    };
    Ok(logical.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn relocates_and_strips_extension() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("files")).unwrap();
        fs::write(dir.path().join("files/check.cpp"), "code").unwrap();

        let logical = relocate("files/check.cpp", dir.path()).unwrap();
        assert_eq!(logical, "check");
        assert_eq!(
            fs::read_to_string(dir.path().join("check.cpp")).unwrap(),
            "code"
        );
    }

    #[test]
    fn remaps_legacy_pascal_extension() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("solutions")).unwrap();
        fs::write(dir.path().join("solutions/sol.dpr"), "program sol;").unwrap();

        let logical = relocate("solutions/sol.dpr", dir.path()).unwrap();
        assert_eq!(logical, "sol");
        assert!(dir.path().join("sol.pas").exists());
        assert!(!dir.path().join("sol.dpr").exists());
    }

    #[test]
    fn bare_file_name_without_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("testlib.h"), "// testlib").unwrap();

        let logical = relocate("testlib.h", dir.path()).unwrap();
        assert_eq!(logical, "testlib");
    }

    #[test]
    fn overwrites_existing_destination() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("files")).unwrap();
        fs::write(dir.path().join("files/check.cpp"), "new").unwrap();
        fs::write(dir.path().join("check.cpp"), "old").unwrap();

        relocate("files/check.cpp", dir.path()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("check.cpp")).unwrap(),
            "new"
        );
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(relocate("files/absent.cpp", dir.path()).is_err());
    }

    #[test]
    fn flat_name_applies_the_extension_remap() {
        assert_eq!(flat_name("solutions/sol.dpr").unwrap(), "sol.pas");
        assert_eq!(flat_name("files/check.cpp").unwrap(), "check.cpp");
        assert!(flat_name("solutions/").is_err());
    }
}
