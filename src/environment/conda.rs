//! Conda/Mamba Environment Management
//!
//! Provides integration with a conda-compatible package manager for the
//! environment that hosts the dorado binaries.
//!
//! # Manager Resolution Priority
//!
//! The manager executable is resolved in the following order:
//! 1. `mamba` on the system PATH
//! 2. `conda` on the system PATH
//!
//! Neither being present is fatal; the error points at miniforge as the
//! remedy.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::{InstallError, Result};

/// Channels searched when creating the environment, in priority order.
const CHANNELS: &[&str] = &["bioconda", "conda-forge"];

/// Packages declared for a freshly created environment.
pub const ENV_PACKAGES: &[&str] = &["pip", "samtools"];

/// Shape of the `env list --json` document (identical for mamba and conda).
#[derive(Debug, Deserialize)]
struct EnvList {
    envs: Vec<PathBuf>,
}

/// A located conda-compatible package manager.
#[derive(Debug)]
pub struct CondaManager {
    exe: PathBuf,
    base_dir: PathBuf,
}

impl CondaManager {
    /// Locates `mamba` (or `conda` as fallback) on the system PATH.
    ///
    /// The base directory is derived from the executable's location, two
    /// levels up (e.g. `~/miniforge3/condabin/mamba` -> `~/miniforge3`),
    /// and is used as the fallback root for environment directories.
    pub fn locate() -> Result<Self> {
        let exe = which::which("mamba")
            .or_else(|_| which::which("conda"))
            .map_err(|_| InstallError::ManagerNotFound)?;

        let base_dir = base_dir_of(&exe).ok_or(InstallError::ManagerNotFound)?;

        info!("Using package manager: {}", exe.display());
        debug!("Manager base directory: {}", base_dir.display());

        Ok(Self { exe, base_dir })
    }

    /// Returns the manager executable path.
    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Returns the manager's base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Short name of the manager executable, for log and error messages.
    fn name(&self) -> &str {
        self.exe
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("conda")
    }

    /// Runs a manager subcommand, capturing output.
    ///
    /// Returns an error if the process cannot be launched or exits
    /// non-zero; stderr is folded into the error message.
    fn run(&self, args: &[&str]) -> Result<Output> {
        let command = format!("{} {}", self.name(), args.join(" "));
        debug!("Running: {}", command);

        let output = Command::new(&self.exe)
            .args(args)
            .output()
            .map_err(|e| InstallError::CommandLaunch {
                command: command.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(InstallError::CommandFailed {
                command,
                status: output.status,
                stderr,
            });
        }

        Ok(output)
    }

    /// Lists the directories of all environments known to the manager.
    pub fn list_envs(&self) -> Result<Vec<PathBuf>> {
        let output = self.run(&["env", "list", "--json"])?;
        let command = format!("{} env list --json", self.name());
        parse_env_list(&command, &output.stdout)
    }

    /// Searches the environment list for `name`.
    ///
    /// Matching is a case-insensitive substring check against the
    /// environment's directory name.
    pub fn find_env(&self, name: &str) -> Result<Option<PathBuf>> {
        let envs = self.list_envs()?;
        Ok(match_env(&envs, name).cloned())
    }

    /// Removes an existing environment.
    ///
    /// The primary path is the manager's own removal command, addressed by
    /// the discovered directory name. If that fails for any reason, the
    /// environment directory is deleted directly; only both failing is
    /// fatal.
    pub fn remove_env(&self, env_dir: &Path) -> Result<()> {
        let env_name = env_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        info!("Removing environment '{}'", env_name);

        match self.run(&["env", "remove", "-y", "-n", &env_name]) {
            Ok(_) => {
                info!("Environment '{}' removed", env_name);
                Ok(())
            }
            Err(e) => {
                warn!(
                    "`{} env remove` failed ({}); deleting {} directly",
                    self.name(),
                    e,
                    env_dir.display()
                );
                fs::remove_dir_all(env_dir).map_err(|io_err| InstallError::EnvironmentRemoval {
                    name: env_name,
                    reason: io_err.to_string(),
                })
            }
        }
    }

    /// Creates a new environment with the given packages.
    pub fn create_env(&self, name: &str, packages: &[&str]) -> Result<()> {
        info!(
            "Creating environment '{}' with packages: {:?} (this may take a few minutes)",
            name, packages
        );

        let mut args = vec!["create", "-y", "-n", name];
        for channel in CHANNELS {
            args.push("-c");
            args.push(channel);
        }
        args.extend_from_slice(packages);

        self.run(&args)?;

        info!("Environment '{}' created", name);
        Ok(())
    }

    /// Resolves `name` to a concrete, existing environment directory.
    ///
    /// Queries the environment list first; falls back to the conventional
    /// `<base>/envs/<name>` location. Failure to resolve is fatal.
    pub fn resolve_env(&self, name: &str) -> Result<PathBuf> {
        if let Some(dir) = self.find_env(name)? {
            if dir.is_dir() {
                return Ok(dir);
            }
        }

        let candidate = self.base_dir.join("envs").join(name);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        Err(InstallError::EnvironmentUnresolved {
            name: name.to_string(),
        })
    }
}

/// Derives the manager's base directory: two levels up from the executable.
fn base_dir_of(exe: &Path) -> Option<PathBuf> {
    exe.parent().and_then(Path::parent).map(Path::to_path_buf)
}

/// Parses an `env list --json` document into environment directories.
fn parse_env_list(command: &str, stdout: &[u8]) -> Result<Vec<PathBuf>> {
    let doc: EnvList = serde_json::from_slice(stdout).map_err(|e| InstallError::CommandOutput {
        command: command.to_string(),
        source: e,
    })?;
    Ok(doc.envs)
}

/// Finds the first environment whose directory name contains `name`,
/// case-insensitively.
fn match_env<'a>(envs: &'a [PathBuf], name: &str) -> Option<&'a PathBuf> {
    let needle = name.to_lowercase();
    envs.iter().find(|env| {
        env.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

/// Finds or creates the named environment and returns its directory.
///
/// This is the full resolver pipeline:
/// 1. Locate the manager executable (mamba, then conda)
/// 2. Search the environment list by name
/// 3. Remove the environment first when a clean install was requested
/// 4. Create the environment if absent (or just removed)
/// 5. Resolve and validate the environment directory
pub fn prepare_environment(name: &str, clean_install: bool) -> Result<PathBuf> {
    let manager = CondaManager::locate()?;

    let mut existing = manager.find_env(name)?;

    if clean_install {
        if let Some(dir) = existing.take() {
            info!("Clean install requested");
            manager.remove_env(&dir)?;
        }
    }

    match existing {
        Some(ref dir) => info!("Reusing existing environment at {}", dir.display()),
        None => manager.create_env(name, ENV_PACKAGES)?,
    }

    let env_dir = manager.resolve_env(name)?;
    info!("Environment directory: {}", env_dir.display());

    Ok(env_dir)
}
