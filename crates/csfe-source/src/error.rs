//! Error types for source units
//!
//! Covers ingress (read + parse) and egress (print + write) of Python files.

use std::path::PathBuf;

/// Errors reading, parsing or writing a source unit
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Grammar could not be loaded into the parser
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// Parser produced no tree
    #[error("parse failed for {0}")]
    ParseFailed(String),

    /// Source contains a syntax error
    #[error("syntax error in {origin} at {line}:{column}")]
    Syntax {
        origin: String,
        line: usize,
        column: usize,
    },

    /// Requested class is not declared in the unit
    #[error("class '{class}' not found in {origin}")]
    ClassNotFound { class: String, origin: String },

    /// IO error during read or write
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create class-not-found error
    pub fn class_not_found(class: impl Into<String>, origin: impl Into<String>) -> Self {
        Self::ClassNotFound {
            class: class.into(),
            origin: origin.into(),
        }
    }

    /// Whether the failure happened while touching the filesystem
    #[inline]
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
