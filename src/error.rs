//! Installer Error Types
//!
//! Every failure in the pipeline is fatal and maps to one of these
//! variants; the binary prints the message and exits non-zero. Messages
//! carry the remedy where one exists (download pointers, install hints).

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, InstallError>;

/// Errors raised by the installation pipeline.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Neither `mamba` nor `conda` was found on PATH.
    #[error(
        "no conda-compatible package manager found on PATH (tried `mamba`, then `conda`). \
         Install miniforge from https://github.com/conda-forge/miniforge and retry"
    )]
    ManagerNotFound,

    /// A child process could not be started at all.
    #[error("failed to launch `{command}`: {source}")]
    CommandLaunch {
        command: String,
        source: io::Error,
    },

    /// A child process ran but reported failure.
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// A child process succeeded but produced unparseable output.
    #[error("could not parse output of `{command}`: {source}")]
    CommandOutput {
        command: String,
        source: serde_json::Error,
    },

    /// No archive matching the expected naming pattern was found.
    #[error(
        "no dorado archive matching `dorado-<major>.<minor>.<patch>-linux-x64.tar.gz` found in {}. \
         Download one from https://github.com/nanoporetech/dorado",
        .dir.display()
    )]
    NoArchiveFound { dir: PathBuf },

    /// Extraction finished but the expected folder never appeared.
    #[error("archive extraction did not produce the expected folder {}", .dir.display())]
    ExtractionMissing { dir: PathBuf },

    /// The extracted archive is missing one of its payload directories.
    #[error("extracted archive {} is missing its `{}/` payload", .dir.display(), .subdir)]
    PayloadMissing {
        dir: PathBuf,
        subdir: &'static str,
    },

    /// The dorado binary was not present after the payload copy.
    #[error("dorado binary missing after install at {}", .path.display())]
    BinaryMissing { path: PathBuf },

    /// The installed binary exists but is not executable.
    #[error("installed dorado binary at {} is not executable", .path.display())]
    BinaryNotExecutable { path: PathBuf },

    /// The environment could not be resolved to an existing directory.
    #[error("environment `{name}` could not be resolved to an existing directory")]
    EnvironmentUnresolved { name: String },

    /// Both the removal command and the direct-deletion fallback failed.
    #[error("failed to remove environment `{name}`: {reason}")]
    EnvironmentRemoval { name: String, reason: String },

    /// A filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: io::Error,
    },
}

impl InstallError {
    /// Wraps an I/O error with a human-readable context line.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
