//! Payload Deployment
//!
//! Places the extracted `bin/` and `lib/` payloads into the environment
//! and maintains the launcher symlink. The target layout is a fixed
//! invariant: binaries land in `<env>/bin/bin`, libraries in
//! `<env>/bin/lib`, and `<env>/bin/dorado` is a symlink to the nested
//! binary. Keeping `lib/` next to the nested `bin/` lets the binary's
//! relative rpath keep resolving.

use std::fs;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{InstallError, Result};
use crate::TOOL_NAME;

/// Fixed install locations inside an environment.
#[derive(Debug)]
pub struct InstallLayout {
    env_bin: PathBuf,
    target_bin: PathBuf,
    target_lib: PathBuf,
}

impl InstallLayout {
    /// Derives the layout from the environment's root directory.
    pub fn new(env_dir: &Path) -> Self {
        let env_bin = env_dir.join("bin");
        Self {
            target_bin: env_bin.join("bin"),
            target_lib: env_bin.join("lib"),
            env_bin,
        }
    }

    /// Directory receiving the payload's binaries.
    pub fn target_bin(&self) -> &Path {
        &self.target_bin
    }

    /// Directory receiving the payload's shared libraries.
    pub fn target_lib(&self) -> &Path {
        &self.target_lib
    }

    /// Path of the launcher symlink in the environment's own `bin/`.
    pub fn link_path(&self) -> PathBuf {
        self.env_bin.join(TOOL_NAME)
    }

    /// Path of the installed binary the symlink must resolve to.
    pub fn binary_path(&self) -> PathBuf {
        self.target_bin.join(TOOL_NAME)
    }
}

/// Copies the extracted payload into the environment.
///
/// Steps, each fatal on failure:
/// 1. Ensure the target directories exist
/// 2. Clear stale entries from previous installs
/// 3. Verify the extraction carries both `bin/` and `lib/` payloads
/// 4. Recursively copy both payloads
/// 5. Verify the installed binary exists and is executable
/// 6. Create or repair the launcher symlink
pub fn install_payload(extract_dir: &Path, layout: &InstallLayout) -> Result<()> {
    ensure_dir(&layout.target_bin)?;
    ensure_dir(&layout.target_lib)?;

    clear_stale_entries(&layout.target_bin, true)?;
    clear_stale_entries(&layout.target_lib, false)?;

    let source_bin = extract_dir.join("bin");
    let source_lib = extract_dir.join("lib");

    for (source, subdir) in [(&source_bin, "bin"), (&source_lib, "lib")] {
        if !source.is_dir() {
            return Err(InstallError::PayloadMissing {
                dir: extract_dir.to_path_buf(),
                subdir,
            });
        }
    }

    info!("Installing binaries into {}", layout.target_bin.display());
    copy_recursive(&source_bin, &layout.target_bin)?;

    info!("Installing libraries into {}", layout.target_lib.display());
    copy_recursive(&source_lib, &layout.target_lib)?;

    let binary = layout.binary_path();
    if !binary.is_file() {
        return Err(InstallError::BinaryMissing { path: binary });
    }
    if !is_executable(&binary) {
        return Err(InstallError::BinaryNotExecutable { path: binary });
    }

    ensure_symlink(&layout.link_path(), &binary)?;

    Ok(())
}

/// Creates a directory (and parents) if missing.
fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| InstallError::io(format!("failed to create {}", dir.display()), e))
}

/// Removes stale entries from a target directory.
///
/// The binary target keeps symlinked entries (`keep_symlinks`); the
/// library target is cleared completely.
fn clear_stale_entries(dir: &Path, keep_symlinks: bool) -> Result<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| InstallError::io(format!("failed to read {}", dir.display()), e))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| InstallError::io(format!("failed to read {}", dir.display()), e))?;
        let file_type = entry.file_type().map_err(|e| {
            InstallError::io(format!("failed to inspect {}", entry.path().display()), e)
        })?;

        if keep_symlinks && file_type.is_symlink() {
            continue;
        }

        let path = entry.path();
        debug!("Removing stale entry {}", path.display());

        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| InstallError::io(format!("failed to remove {}", path.display()), e))?;
    }

    Ok(())
}

/// Recursively copies a payload directory.
///
/// Regular files are copied with their permissions; symlinks inside the
/// payload (shared-library alias chains) are recreated, not followed.
fn copy_recursive(src: &Path, dst: &Path) -> Result<()> {
    let entries = fs::read_dir(src)
        .map_err(|e| InstallError::io(format!("failed to read {}", src.display()), e))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| InstallError::io(format!("failed to read {}", src.display()), e))?;
        let file_type = entry.file_type().map_err(|e| {
            InstallError::io(format!("failed to inspect {}", entry.path().display()), e)
        })?;

        let source = entry.path();
        let target = dst.join(entry.file_name());

        if file_type.is_dir() {
            ensure_dir(&target)?;
            copy_recursive(&source, &target)?;
        } else if file_type.is_symlink() {
            let link_target = fs::read_link(&source).map_err(|e| {
                InstallError::io(format!("failed to read link {}", source.display()), e)
            })?;
            if target.symlink_metadata().is_ok() {
                fs::remove_file(&target).map_err(|e| {
                    InstallError::io(format!("failed to remove {}", target.display()), e)
                })?;
            }
            symlink(&link_target, &target).map_err(|e| {
                InstallError::io(format!("failed to link {}", target.display()), e)
            })?;
        } else {
            fs::copy(&source, &target).map_err(|e| {
                InstallError::io(
                    format!("failed to copy {} to {}", source.display(), target.display()),
                    e,
                )
            })?;
        }
    }

    Ok(())
}

/// Creates or repairs the launcher symlink.
///
/// A correct link is left untouched. A wrong link, or any non-symlink
/// entry squatting on the path, is replaced.
fn ensure_symlink(link: &Path, target: &Path) -> Result<()> {
    if let Ok(metadata) = fs::symlink_metadata(link) {
        if metadata.file_type().is_symlink() {
            if let Ok(current) = fs::read_link(link) {
                if current == target {
                    debug!("Symlink already correct: {}", link.display());
                    return Ok(());
                }
            }
        }
        debug!("Replacing incorrect entry at {}", link.display());
        fs::remove_file(link)
            .map_err(|e| InstallError::io(format!("failed to remove {}", link.display()), e))?;
    }

    symlink(target, link)
        .map_err(|e| InstallError::io(format!("failed to link {}", link.display()), e))?;

    info!("Linked {} -> {}", link.display(), target.display());
    Ok(())
}

/// Checks for an execute permission bit.
fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
