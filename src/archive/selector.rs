//! Archive Selection
//!
//! Scans the working directory for downloaded dorado release archives
//! (`dorado-<major>.<minor>.<patch>-linux-x64.tar.gz`), orders them by
//! their embedded version, and picks the newest one.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use semver::Version;

use crate::error::{InstallError, Result};

/// Leading part of a release archive file name.
const ARCHIVE_PREFIX: &str = "dorado-";

/// Trailing part of a release archive file name (Linux x64 builds only).
const ARCHIVE_SUFFIX: &str = "-linux-x64.tar.gz";

/// Extension stripped to derive the extraction folder name.
const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// A release archive found in the working directory.
#[derive(Debug, Clone)]
pub struct ArchiveCandidate {
    pub path: PathBuf,
    pub version: Version,
}

impl ArchiveCandidate {
    /// The archive's bare file name.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Name of the folder the archive extracts to (file name without the
    /// `.tar.gz` extension).
    pub fn extract_dir_name(&self) -> String {
        let name = self.file_name();
        name.strip_suffix(ARCHIVE_EXTENSION).unwrap_or(name).to_string()
    }
}

/// Extracts the version from an archive file name.
///
/// Returns `None` for names that don't match the release naming pattern
/// at all; names that match the pattern but carry an unusable version
/// component are also `None` (the caller decides whether to warn).
fn parse_archive_name(name: &str) -> Option<Version> {
    let middle = name
        .strip_prefix(ARCHIVE_PREFIX)?
        .strip_suffix(ARCHIVE_SUFFIX)?;
    parse_version(middle)
}

/// Parses a strict `major.minor.patch` version.
///
/// Pre-release and build-metadata suffixes are rejected rather than
/// best-effort sorted; an unparseable version must never win selection.
fn parse_version(text: &str) -> Option<Version> {
    let version = Version::parse(text).ok()?;
    if !version.pre.is_empty() || !version.build.is_empty() {
        return None;
    }
    Some(version)
}

/// Scans `dir` for release archives, sorted by ascending version.
///
/// Files that match the archive shape but carry a malformed version are
/// skipped with a warning.
pub fn scan_archives(dir: &Path) -> Result<Vec<ArchiveCandidate>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| InstallError::io(format!("failed to read directory {}", dir.display()), e))?;

    let mut candidates = Vec::new();

    for entry in entries {
        let entry = entry
            .map_err(|e| InstallError::io(format!("failed to read directory {}", dir.display()), e))?;

        if !entry.path().is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };

        let shape_matches = name.starts_with(ARCHIVE_PREFIX) && name.ends_with(ARCHIVE_SUFFIX);
        match parse_archive_name(name) {
            Some(version) => candidates.push(ArchiveCandidate {
                path: entry.path(),
                version,
            }),
            None if shape_matches => {
                warn!("Skipping '{}': version is not plain major.minor.patch", name);
            }
            None => {}
        }
    }

    candidates.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(candidates)
}

/// Selects the newest release archive in `dir`.
///
/// Zero matches is fatal with a pointer to the download source. When
/// several archives are present the highest version wins and the losers
/// are listed in a warning.
pub fn select_archive(dir: &Path) -> Result<ArchiveCandidate> {
    let mut candidates = scan_archives(dir)?;

    let Some(selected) = candidates.pop() else {
        return Err(InstallError::NoArchiveFound {
            dir: dir.to_path_buf(),
        });
    };

    if !candidates.is_empty() {
        warn!(
            "Found {} dorado archives; installing the newest ({})",
            candidates.len() + 1,
            selected.file_name()
        );
        for ignored in &candidates {
            warn!("  Ignoring older archive: {}", ignored.file_name());
        }
    }

    info!(
        "Selected archive: {} (version {})",
        selected.file_name(),
        selected.version
    );

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_parse_archive_name_valid() {
        let version = parse_archive_name("dorado-2.3.10-linux-x64.tar.gz").unwrap();
        assert_eq!(version, Version::new(2, 3, 10));
    }

    #[test]
    fn test_parse_archive_name_wrong_prefix() {
        assert!(parse_archive_name("guppy-1.0.0-linux-x64.tar.gz").is_none());
    }

    #[test]
    fn test_parse_archive_name_wrong_platform() {
        assert!(parse_archive_name("dorado-1.0.0-osx-arm64.tar.gz").is_none());
        assert!(parse_archive_name("dorado-1.0.0-linux-x64.zip").is_none());
    }

    #[test]
    fn test_parse_version_rejects_prerelease() {
        assert!(parse_version("2.3.1-rc1").is_none());
        assert!(parse_version("2.3.1+build5").is_none());
    }

    #[test]
    fn test_parse_version_rejects_incomplete() {
        assert!(parse_version("2.3").is_none());
        assert!(parse_version("2").is_none());
        assert!(parse_version("2.3.x").is_none());
    }

    #[test]
    fn test_extract_dir_name_strips_extension() {
        let candidate = ArchiveCandidate {
            path: PathBuf::from("/data/dorado-0.5.3-linux-x64.tar.gz"),
            version: Version::new(0, 5, 3),
        };
        assert_eq!(candidate.extract_dir_name(), "dorado-0.5.3-linux-x64");
    }

    #[test]
    fn test_select_archive_numeric_not_lexical_order() {
        let temp_dir = tempdir().unwrap();
        touch(temp_dir.path(), "dorado-1.0.0-linux-x64.tar.gz");
        touch(temp_dir.path(), "dorado-2.3.1-linux-x64.tar.gz");
        touch(temp_dir.path(), "dorado-2.3.10-linux-x64.tar.gz");

        let selected = select_archive(temp_dir.path()).unwrap();
        // 2.3.10 beats 2.3.1 even though "2.3.1" sorts after "2.3.10"
        // lexically.
        assert_eq!(selected.version, Version::new(2, 3, 10));
    }

    #[test]
    fn test_select_archive_empty_dir_is_fatal() {
        let temp_dir = tempdir().unwrap();
        let result = select_archive(temp_dir.path());
        assert!(matches!(result, Err(InstallError::NoArchiveFound { .. })));
    }

    #[test]
    fn test_select_archive_ignores_unrelated_files() {
        let temp_dir = tempdir().unwrap();
        touch(temp_dir.path(), "notes.txt");
        touch(temp_dir.path(), "dorado-1.2.3-linux-x64.tar.gz.part");
        touch(temp_dir.path(), "dorado-1.2.3-linux-x64.tar.gz");

        let selected = select_archive(temp_dir.path()).unwrap();
        assert_eq!(selected.version, Version::new(1, 2, 3));
    }

    #[test]
    fn test_scan_archives_skips_malformed_versions() {
        let temp_dir = tempdir().unwrap();
        touch(temp_dir.path(), "dorado-1.0.0-rc1-linux-x64.tar.gz");
        touch(temp_dir.path(), "dorado-1.0-linux-x64.tar.gz");
        touch(temp_dir.path(), "dorado-0.9.1-linux-x64.tar.gz");

        let archives = scan_archives(temp_dir.path()).unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].version, Version::new(0, 9, 1));
    }

    #[test]
    fn test_scan_archives_skips_directories() {
        let temp_dir = tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("dorado-1.0.0-linux-x64.tar.gz")).unwrap();

        let archives = scan_archives(temp_dir.path()).unwrap();
        assert!(archives.is_empty());
    }

    #[test]
    fn test_scan_archives_sorted_ascending() {
        let temp_dir = tempdir().unwrap();
        touch(temp_dir.path(), "dorado-0.3.0-linux-x64.tar.gz");
        touch(temp_dir.path(), "dorado-0.10.0-linux-x64.tar.gz");
        touch(temp_dir.path(), "dorado-0.2.5-linux-x64.tar.gz");

        let archives = scan_archives(temp_dir.path()).unwrap();
        let versions: Vec<String> = archives.iter().map(|a| a.version.to_string()).collect();
        assert_eq!(versions, vec!["0.2.5", "0.3.0", "0.10.0"]);
    }
}
