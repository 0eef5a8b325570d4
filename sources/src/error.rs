//! Error types for file-backed sources and chain configuration.

use std::path::PathBuf;

use flag_resolver_core::ResolveError;
use thiserror::Error;

/// Errors that can occur while loading sources or building a chain.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Failure raised by the core resolver machinery (JSON decoding,
    /// validation).
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A source file failed to load.
    #[error("failed to load {}: {source}", path.display())]
    Load {
        /// File that failed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<SourceError>,
    },

    /// A YAML value holds `.nan` or `.inf`, which has no JSON counterpart.
    #[error("value of {0:?} is not a finite number")]
    NonFiniteNumber(String),

    /// A document file has an extension no decoder handles.
    #[error("unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Chain configuration failed validation.
    #[error("invalid chain configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results with [`SourceError`].
pub type Result<T> = std::result::Result<T, SourceError>;
