use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the woodhouse library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Input could not be parsed as a notebook document.
    #[error("Invalid notebook document '{path}': {message}")]
    InvalidDocument {
        /// Path of the offending document (empty for in-memory input)
        path: PathBuf,
        /// Parser or structure error
        message: String,
    },

    /// Notebook uses a format version other than 4.
    #[error("Unsupported notebook format {major}.{minor} in '{path}' (expected 4.x)")]
    UnsupportedVersion {
        /// Path of the offending document
        path: PathBuf,
        /// `nbformat` value
        major: u64,
        /// `nbformat_minor` value
        minor: u64,
    },

    /// The requested operation is ambiguous or malformed.
    #[error("{message}")]
    Usage {
        /// What the caller has to change
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// Multiple errors occurred during processing.
    #[error("Multiple errors occurred during processing ({count} errors)")]
    Multiple {
        /// Number of errors
        count: usize,
        /// Collection of errors
        errors: Vec<Error>,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates an invalid document error.
    #[must_use]
    pub fn invalid_document(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a usage error.
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Combines multiple errors into a single error.
    #[must_use]
    pub fn multiple(errors: Vec<Self>) -> Self {
        let count = errors.len();
        Self::Multiple { count, errors }
    }

    /// Attaches a file path to document errors raised while parsing in memory.
    #[must_use]
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::InvalidDocument { message, .. } => Self::InvalidDocument {
                path: path.into(),
                message,
            },
            Self::UnsupportedVersion { major, minor, .. } => Self::UnsupportedVersion {
                path: path.into(),
                major,
                minor,
            },
            other => other,
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if the input was not a usable notebook.
    #[must_use]
    pub const fn is_invalid_document(&self) -> bool {
        matches!(
            self,
            Self::InvalidDocument { .. } | Self::UnsupportedVersion { .. }
        )
    }

    /// Returns true if this is a usage error.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
