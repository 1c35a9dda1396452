//! Archive Extraction
//!
//! Unpacks the selected release archive into the working directory and
//! manages the lifecycle of the extraction folder (stale-folder removal
//! before, cleanup after).

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, info};
use tar::Archive;

use crate::archive::ArchiveCandidate;
use crate::error::{InstallError, Result};

/// Unpacks `archive` into `work_dir` and returns the extraction folder.
///
/// Any folder of the same derived name left over from an earlier run is
/// removed first so re-runs start clean. The run is fatal if the expected
/// folder does not appear after unpacking.
pub fn extract_archive(archive: &ArchiveCandidate, work_dir: &Path) -> Result<PathBuf> {
    let extract_dir = work_dir.join(archive.extract_dir_name());

    remove_extraction_dir(&extract_dir)?;

    info!("Extracting {}", archive.file_name());

    let file = File::open(&archive.path).map_err(|e| {
        InstallError::io(
            format!("failed to open archive {}", archive.path.display()),
            e,
        )
    })?;

    let decoder = GzDecoder::new(BufReader::new(file));
    let mut tarball = Archive::new(decoder);
    // The dorado binary must keep its execute bit through extraction.
    tarball.set_preserve_permissions(true);
    tarball
        .unpack(work_dir)
        .map_err(|e| InstallError::io(format!("failed to extract {}", archive.file_name()), e))?;

    if !extract_dir.is_dir() {
        return Err(InstallError::ExtractionMissing { dir: extract_dir });
    }

    debug!("Extracted to {}", extract_dir.display());
    Ok(extract_dir)
}

/// Removes an extraction folder, tolerating its absence.
pub fn remove_extraction_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        debug!("Removing extraction folder {}", dir.display());
        fs::remove_dir_all(dir)
            .map_err(|e| InstallError::io(format!("failed to remove {}", dir.display()), e))?;
    }
    Ok(())
}
