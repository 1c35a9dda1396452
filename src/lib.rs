//! dorado-install - Dorado Basecaller Installer
//!
//! A command-line helper that installs the Oxford Nanopore dorado
//! basecaller from a downloaded release archive into a named environment
//! managed by mamba/conda, keeping a `dorado` symlink in the
//! environment's `bin/` so the tool is reachable without PATH edits.
//!
//! # Architecture
//!
//! The library is organized into four main modules:
//!
//! - [`environment`]: Conda/mamba integration (find, create, remove,
//!   resolve the managed environment)
//! - [`archive`]: Release-archive discovery and version-aware selection
//! - [`install`]: Extraction, payload deployment, and symlink upkeep
//! - [`error`]: The fatal-error taxonomy shared by the pipeline
//!
//! # Example
//!
//! ```rust,no_run
//! use dorado_install::{prepare_environment, run_install, select_archive, ENV_NAME};
//!
//! fn main() -> dorado_install::Result<()> {
//!     let work_dir = std::path::PathBuf::from(".");
//!
//!     let env_dir = prepare_environment(ENV_NAME, false)?;
//!     let archive = select_archive(&work_dir)?;
//!     run_install(&archive, &env_dir, &work_dir)?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod environment;
pub mod error;
pub mod install;

// Re-export commonly used types
pub use archive::selector::select_archive;
pub use environment::conda::prepare_environment;
pub use error::{InstallError, Result};
pub use install::run_install;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "dorado-install";

/// Name of the installed tool binary.
pub const TOOL_NAME: &str = "dorado";

/// Name of the managed environment that hosts the tool.
pub const ENV_NAME: &str = "dorado";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "dorado-install");
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(
                part.parse::<u32>().is_ok(),
                "Version components should be numeric"
            );
        }
    }

    #[test]
    fn test_tool_and_env_names() {
        assert_eq!(TOOL_NAME, "dorado");
        assert_eq!(ENV_NAME, "dorado");
    }
}
