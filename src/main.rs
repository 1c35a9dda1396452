//! dorado-install CLI Entry Point
//!
//! Installs the dorado basecaller from a downloaded release archive in
//! the current directory into the managed conda environment.
//!
//! # Usage
//!
//! ```bash
//! # Install the newest archive in the current directory
//! dorado-install
//!
//! # Remove and recreate the environment first
//! dorado-install --clean-install
//!
//! # With debug logging
//! dorado-install --verbose
//! ```

use std::env;
use std::io::IsTerminal;
use std::process::ExitCode;

use colored::Colorize;
use log::info;

use dorado_install::error::InstallError;
use dorado_install::install::InstallLayout;
use dorado_install::{prepare_environment, run_install, select_archive};
use dorado_install::{APP_NAME, ENV_NAME, TOOL_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    clean_install: bool,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Dorado Basecaller Installer");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: dorado-install [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --clean-install     Remove and recreate the environment before installing");
    println!("  --verbose, -v       Enable debug logging");
    println!("  --help, -h          Show this help message");
    println!("  --version, -V       Show version information");
    println!();
    println!("The current directory must contain a downloaded release archive named");
    println!("dorado-<major>.<minor>.<patch>-linux-x64.tar.gz");
    println!("(download from https://github.com/nanoporetech/dorado)");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--clean-install" => {
                config.clean_install = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                return Err(format!("Unexpected argument: {}", arg));
            }
        }
    }

    Ok(config)
}

// ---- UI helpers (no-op color when stdout isn't a TTY) ----

fn use_color() -> bool {
    std::io::stdout().is_terminal() && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

fn success(msg: &str) {
    if use_color() {
        println!("{}", msg.green());
    } else {
        println!("{}", msg);
    }
}

fn hint(msg: &str) {
    if use_color() {
        println!("{}", msg.cyan());
    } else {
        println!("{}", msg);
    }
}

fn fail(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

/// Runs the installation pipeline.
fn run(config: &Config) -> Result<(), InstallError> {
    let work_dir = env::current_dir()
        .map_err(|e| InstallError::io("failed to resolve the working directory", e))?;
    info!("Working directory: {}", work_dir.display());

    if config.clean_install {
        info!("Mode: CLEAN INSTALL (environment will be recreated)");
    }

    let env_dir = prepare_environment(ENV_NAME, config.clean_install)?;
    let archive = select_archive(&work_dir)?;
    run_install(&archive, &env_dir, &work_dir)?;

    let layout = InstallLayout::new(&env_dir);

    println!();
    success(&format!(
        "{} {} installed into {}",
        TOOL_NAME,
        archive.version,
        env_dir.display()
    ));
    hint(&format!(
        "Verify with: {} --version",
        layout.link_path().display()
    ));

    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let config = match parse_arguments(&args) {
        Ok(config) => config,
        Err(e) => {
            fail(&format!("Error: {}", e));
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    setup_logging(config.verbose);
    print_banner();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            fail(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("dorado-install")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_arguments_defaults() {
        let config = parse_arguments(&args(&[])).unwrap();
        assert!(!config.clean_install);
        assert!(!config.verbose);
    }

    #[test]
    fn test_parse_arguments_clean_install() {
        let config = parse_arguments(&args(&["--clean-install"])).unwrap();
        assert!(config.clean_install);
    }

    #[test]
    fn test_parse_arguments_verbose() {
        let config = parse_arguments(&args(&["--verbose"])).unwrap();
        assert!(config.verbose);

        let config = parse_arguments(&args(&["-v", "--clean-install"])).unwrap();
        assert!(config.verbose);
        assert!(config.clean_install);
    }

    #[test]
    fn test_parse_arguments_unknown_flag() {
        let result = parse_arguments(&args(&["--bogus"]));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("--bogus"));
    }

    #[test]
    fn test_parse_arguments_rejects_positional() {
        let result = parse_arguments(&args(&["archive.tar.gz"]));
        assert!(result.is_err());
    }
}
