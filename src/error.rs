//! Error taxonomy for class indexing and extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the extraction pipeline.
///
/// Policy exclusions (visibility, `@internal`, deprecation, constructor) are
/// not errors; filtered members are simply absent from the output.
#[derive(Debug, Error)]
pub enum Error {
    /// The class doc comment carries `@internal` and the caller did not opt in.
    #[error("Class {class} is marked as internal.")]
    ClassNotPublic { class: String },

    /// A member named in explicit-member mode exists under none of the three kinds.
    #[error("Cannot extract constant nor property nor method \"{member}\" from class \"{class}\"")]
    MemberNotFound { member: String, class: String },

    /// The requested class is not part of the indexed sources.
    #[error("class \"{class}\" was not found in the indexed sources")]
    ClassNotFound { class: String },

    /// A configuration field is missing or invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A configuration document could not be decoded.
    #[error("failed to decode configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    /// Failed to read a source or configuration file.
    #[error("failed to read '{path}': {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A PHP source could not be tokenized.
    #[error("failed to tokenize {source_name} at line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    /// A doc comment could not be interpreted.
    #[error("malformed doc comment: {reason}")]
    MalformedDocComment { reason: String },
}

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }
}
