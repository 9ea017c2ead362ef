//! Resolver decisions
//!
//! Exactly one [`Action`] is produced per resolver pass and consumed once by
//! the executor. Actions are never stored.

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use serde::Serialize;

use crate::resolution::FieldResolution;

/// Decision produced by the resolver for one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing drifted; reconcile generated members with history
    ApplyHistory {
        /// Every live field with its recorded resolution
        fields: IndexMap<String, FieldResolution>,
    },
    /// A new binary field was resolved
    NewKey {
        /// Field name
        name: String,
        /// Chosen resolution
        resolution: FieldResolution,
    },
    /// A new field replaces a missing one
    Rename {
        /// Field name recorded in history
        old_name: String,
        /// Resolution recorded in history
        old_resolution: FieldResolution,
        /// Live field name
        new_name: String,
        /// Resolution chosen for the live field
        new_resolution: FieldResolution,
    },
    /// Forget a missing field, leave the source alone
    RemoveAsIs {
        /// Field name recorded in history
        name: String,
    },
    /// Forget a missing field and purge its generated members
    RemoveClean {
        /// Field name recorded in history
        name: String,
        /// Resolution recorded in history
        resolution: FieldResolution,
    },
    /// Regenerate the members of a missing field and keep it in history
    ReAdd {
        /// Field name recorded in history
        name: String,
        /// Resolution recorded in history
        resolution: FieldResolution,
    },
}

/// Discriminant of an [`Action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ApplyHistory,
    NewKey,
    Rename,
    RemoveAsIs,
    RemoveClean,
    ReAdd,
}

impl Action {
    /// Kind of this action
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ApplyHistory { .. } => ActionKind::ApplyHistory,
            Action::NewKey { .. } => ActionKind::NewKey,
            Action::Rename { .. } => ActionKind::Rename,
            Action::RemoveAsIs { .. } => ActionKind::RemoveAsIs,
            Action::RemoveClean { .. } => ActionKind::RemoveClean,
            Action::ReAdd { .. } => ActionKind::ReAdd,
        }
    }

    /// Whether executing this action rewrites history
    #[inline]
    #[must_use]
    pub fn touches_history(&self) -> bool {
        !matches!(self, Action::ApplyHistory { .. })
    }

    /// Whether executing this action edits source
    #[inline]
    #[must_use]
    pub fn touches_source(&self) -> bool {
        !matches!(self, Action::RemoveAsIs { .. })
    }

    /// Whether the resolver loop ends after this action
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::ApplyHistory { .. })
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Action::ApplyHistory { fields } => {
                write!(f, "apply history to {} field(s)", fields.len())
            }
            Action::NewKey { name, resolution } => write!(f, "new field '{name}' ({resolution})"),
            Action::Rename {
                old_name, new_name, ..
            } => write!(f, "rename '{old_name}' to '{new_name}'"),
            Action::RemoveAsIs { name } => write!(f, "forget '{name}'"),
            Action::RemoveClean { name, .. } => write!(f, "purge and forget '{name}'"),
            Action::ReAdd { name, .. } => write!(f, "re-add '{name}'"),
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::ApplyHistory => "apply_history",
            ActionKind::NewKey => "new_key",
            ActionKind::Rename => "rename",
            ActionKind::RemoveAsIs => "remove_as_is",
            ActionKind::RemoveClean => "remove_clean",
            ActionKind::ReAdd => "re_add",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_history_is_terminal_and_history_free() {
        let action = Action::ApplyHistory {
            fields: IndexMap::new(),
        };
        assert!(action.is_terminal());
        assert!(!action.touches_history());
        assert_eq!(action.kind(), ActionKind::ApplyHistory);
    }

    #[test]
    fn remove_as_is_leaves_source() {
        let action = Action::RemoveAsIs {
            name: "old".into(),
        };
        assert!(!action.touches_source());
        assert!(action.touches_history());
        assert_eq!(action.to_string(), "forget 'old'");
    }
}
