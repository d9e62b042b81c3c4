//! Error types and result aliases for pakrat operations.
//!
//! Provides a unified error type that covers every fatal condition across the
//! pakrat crates with actionable error messages. Partial results (names the
//! registry does not know, unresolved dependencies) are not errors and are
//! carried as data next to successful results instead.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all pakrat operations
#[derive(Error, Debug)]
pub enum PakratError {
    // Config errors
    #[error("Failed to parse config: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Registry errors
    #[error("Registry error: {message}")]
    Registry { message: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Repository errors
    #[error("Malformed archive {}: {message}", path.display())]
    Archive { path: PathBuf, message: String },

    #[error("Repository index is locked: {}", path.display())]
    IndexLocked { path: PathBuf },

    #[error("Index command '{command}' failed:\n{output}")]
    IndexCommand { command: String, output: String },

    #[error("Operation cancelled")]
    Cancelled,

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for pakrat operations
pub type PakratResult<T> = Result<T, PakratError>;

impl PakratError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create an archive error for a file
    pub fn archive(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            PakratError::Registry { .. } => Some("Check the registry URL in your pakrat config"),
            PakratError::Network { .. } => Some("Check your internet connection and try again"),
            PakratError::IndexLocked { .. } => Some(
                "Another process is modifying the repository; wait for it or remove a stale lock file",
            ),
            PakratError::IndexCommand { .. } => {
                Some("Make sure repo-add and repo-remove are installed and the repository is writable")
            },
            PakratError::Archive { .. } => {
                Some("The archive may be corrupt; rebuild it or remove it from the repository")
            },
            PakratError::ConfigValidation { .. } | PakratError::TomlParse { .. } => {
                Some("Check your pakrat config file or pass --repo explicitly")
            },
            _ => None,
        }
    }
}
