//! Error types
//!
//! `LookupFault` is the only failure the asset router recovers from. The other
//! enums are startup errors and propagate to `main`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The lookup capability failed to execute (as opposed to completing with
/// "not found").
#[derive(Debug, Error)]
pub enum LookupFault {
    #[error("asset root '{}' is unavailable: {source}", root.display())]
    RootUnavailable { root: PathBuf, source: io::Error },

    #[error("failed to read asset '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("asset backend failure: {0}")]
    Backend(String),
}

/// Failure while building a manifest from the build-output directory.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("asset root '{}' does not exist or is not a directory", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to scan '{}': {source}", path.display())]
    Scan { path: PathBuf, source: io::Error },

    #[error("manifest build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration could not be loaded or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid address '{addr}': {source}")]
    Address {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
