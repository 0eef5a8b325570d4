//! Error types for flag resolution.
//!
//! A flag missing from a source is never an error; resolvers report that as
//! `Ok(None)`. Errors cover broken sources, schema problems and the chain's
//! own checks.

use thiserror::Error;

use crate::validate::ValidationError;

/// Errors raised while building, validating or consulting resolvers.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A JSON document could not be decoded into an object.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A document key does not correspond to any declared flag.
    #[error("unknown configuration key {key:?} (no flag named {flag:?})")]
    UnknownKey {
        /// Key as written in the document.
        key: String,
        /// Flag name the key would map to.
        flag: String,
    },

    /// The application schema failed structural validation.
    #[error("invalid application: {0}")]
    InvalidApplication(#[from] ValidationError),

    /// A command path did not match the application's command tree.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A required flag ended up with no value from any source.
    #[error("missing required flag --{0}")]
    MissingRequired(String),

    /// Free-form failure raised by a custom resolver.
    #[error("{0}")]
    Message(String),
}

/// Convenience alias for results with [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;
