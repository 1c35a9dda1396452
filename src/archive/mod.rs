//! Archive Handling Module
//!
//! Locates downloaded dorado release archives and picks the newest one
//! by version-aware ordering.

pub mod selector;

pub use selector::{select_archive, ArchiveCandidate};
