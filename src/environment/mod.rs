//! Environment Management Module
//!
//! Handles integration with conda/mamba for the managed environment
//! that hosts the installed dorado binaries.

pub mod conda;

pub use conda::{prepare_environment, CondaManager, ENV_PACKAGES};
