//! Installation Module
//!
//! Drives the install itself: extracting the release archive, deploying
//! its payloads into the environment, and cleaning up the extraction
//! folder.

pub mod deploy;
pub mod extract;

pub use deploy::{install_payload, InstallLayout};
pub use extract::extract_archive;

use std::path::Path;

use crate::archive::ArchiveCandidate;
use crate::error::Result;

/// Runs the full install sequence for a selected archive.
///
/// Extracts into `work_dir`, deploys the payload into the environment at
/// `env_dir`, then removes the extraction folder. Failures are fatal and
/// leave the extraction folder in place; re-running recovers.
pub fn run_install(archive: &ArchiveCandidate, env_dir: &Path, work_dir: &Path) -> Result<()> {
    let extract_dir = extract::extract_archive(archive, work_dir)?;

    let layout = InstallLayout::new(env_dir);
    deploy::install_payload(&extract_dir, &layout)?;

    extract::remove_extraction_dir(&extract_dir)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use semver::Version;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn build_release_archive(dir: &Path) -> ArchiveCandidate {
        let path = dir.join("dorado-0.5.3-linux-x64.tar.gz");
        let file = File::create(&path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let entries: &[(&str, &[u8], u32)] = &[
            ("dorado-0.5.3-linux-x64/bin/dorado", b"binary", 0o755),
            ("dorado-0.5.3-linux-x64/lib/libdorado.so", b"library", 0o644),
        ];
        for (name, data, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();

        ArchiveCandidate {
            path,
            version: Version::new(0, 5, 3),
        }
    }

    #[test]
    fn test_run_install_end_to_end() {
        let temp_dir = tempdir().unwrap();
        let archive = build_release_archive(temp_dir.path());
        let env_dir = temp_dir.path().join("env");
        fs::create_dir_all(&env_dir).unwrap();

        run_install(&archive, &env_dir, temp_dir.path()).unwrap();

        let layout = InstallLayout::new(&env_dir);
        assert!(layout.binary_path().is_file());
        assert_eq!(
            fs::read_link(layout.link_path()).unwrap(),
            layout.binary_path()
        );

        // The extraction folder is cleaned up after a successful run.
        assert!(!temp_dir.path().join("dorado-0.5.3-linux-x64").exists());
    }

    #[test]
    fn test_run_install_twice_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let archive = build_release_archive(temp_dir.path());
        let env_dir = temp_dir.path().join("env");
        fs::create_dir_all(&env_dir).unwrap();

        run_install(&archive, &env_dir, temp_dir.path()).unwrap();
        let layout = InstallLayout::new(&env_dir);
        let first_link = fs::read_link(layout.link_path()).unwrap();

        run_install(&archive, &env_dir, temp_dir.path()).unwrap();

        assert_eq!(fs::read_link(layout.link_path()).unwrap(), first_link);
        assert!(layout.binary_path().is_file());
        assert!(!temp_dir.path().join("dorado-0.5.3-linux-x64").exists());
    }
}
