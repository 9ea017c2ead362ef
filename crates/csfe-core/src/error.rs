//! Error types for csfe core
//!
//! Classification follows how far a failure unwinds:
//! - [`ResolveError::SelectionAborted`] returns to the field-selection loop
//! - invariant and precondition failures stop the current file
//! - persistence failures abort the action and are logged as warnings

use std::path::PathBuf;

use csfe_editor::EditError;
use csfe_model::{HistoryError, ParseFlavorError};
use csfe_source::SourceError;

/// Failures while resolving one action
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// User aborted an enumeration
    #[error("selection aborted")]
    SelectionAborted,

    /// History contradicts itself or the live class
    #[error("invariant violation in {class}: {detail}")]
    InvariantViolation { class: String, detail: String },

    /// History record could not be decoded
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Answers ran out before the question was settled
    #[error("no answer for: {question}")]
    EndOfInput { question: String },

    /// Prompt channel failed
    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
}

impl ResolveError {
    /// Create invariant violation
    pub fn invariant(class: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            class: class.into(),
            detail: detail.into(),
        }
    }

    /// Whether the session loop may simply ask again
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SelectionAborted)
    }
}

/// Failures while executing one action
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// Class could not be read from the source unit
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// A structural edit was refused
    #[error("edit precondition failed: {0}")]
    Precondition(#[from] EditError),

    /// Rewritten source could not be written
    #[error("source write failed: {0}")]
    SourceWrite(#[source] SourceError),

    /// History could not be written after the source was
    #[error("history write failed: {0}")]
    HistoryWrite(#[source] HistoryError),
}

impl ExecuteError {
    /// Whether the failure happened while persisting
    #[inline]
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::SourceWrite(_) | Self::HistoryWrite(_))
    }
}

/// Failure that ends the processing of one class
#[derive(Debug, thiserror::Error)]
pub enum ClassError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl ClassError {
    /// Whether the remaining classes of the same file are skipped
    #[must_use]
    pub fn is_fatal_for_file(&self) -> bool {
        match self {
            Self::Resolve(ResolveError::SelectionAborted) => false,
            Self::Execute(err) => !err.is_persistence(),
            Self::Resolve(_) | Self::Source(_) => true,
        }
    }

    /// Whether no further question can be answered in this run
    #[must_use]
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::Resolve(ResolveError::EndOfInput { .. } | ResolveError::Prompt(_))
        )
    }
}

/// Invalid environment configuration
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Not one of `true/false/1/0/yes/no`
    #[error("{var}: expected a boolean, found '{value}'")]
    InvalidBool { var: String, value: String },

    /// Unknown adapter flavor
    #[error("{var}: {source}")]
    InvalidAdapter {
        var: String,
        #[source]
        source: ParseFlavorError,
    },
}

/// Failures of a whole run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Configuration could not be resolved
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// History file could not be loaded
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Source tree could not be walked
    #[error("cannot walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_is_the_only_recoverable_resolve_error() {
        assert!(ResolveError::SelectionAborted.is_recoverable());
        assert!(!ResolveError::invariant("Blob", "bad").is_recoverable());
        assert!(!ResolveError::EndOfInput {
            question: "q".into()
        }
        .is_recoverable());
    }

    #[test]
    fn persistence_failures_do_not_stop_the_file() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ClassError::from(ExecuteError::SourceWrite(SourceError::io_error("m.py", io)));
        assert!(!err.is_fatal_for_file());

        let err = ClassError::from(ExecuteError::Precondition(EditError::name_taken("x")));
        assert!(err.is_fatal_for_file());
    }

    #[test]
    fn exhausted_answers_stop_the_run() {
        let err = ClassError::from(ResolveError::EndOfInput {
            question: "q".into(),
        });
        assert!(err.is_fatal_for_run());
        assert!(err.is_fatal_for_file());
    }

    #[test]
    fn settings_error_names_the_variable() {
        let err = SettingsError::InvalidBool {
            var: "CSFE_PURGE".into(),
            value: "maybe".into(),
        };
        assert_eq!(err.to_string(), "CSFE_PURGE: expected a boolean, found 'maybe'");
    }
}
