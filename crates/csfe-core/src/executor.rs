//! Action execution
//!
//! One action is one unit of work:
//!
//! 1. edits run on a copy of the class's member list
//! 2. the source file is rewritten only when every edit succeeded
//! 3. history is written only when the source write succeeded
//!
//! A failed step leaves the in-memory source, the history store and both
//! files as they were.

use csfe_editor::FieldEditor;
use csfe_model::{Action, FieldResolution, HistoryStore};
use csfe_source::{MemberList, SourceFile};

use crate::error::ExecuteError;
use crate::settings::Settings;

/// What an executed action changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Class body was rewritten
    pub source_changed: bool,
    /// History was rewritten
    pub history_changed: bool,
}

/// Applies actions to a source unit and a history store
#[derive(Debug, Clone, Copy)]
pub struct Executor<'a> {
    settings: &'a Settings,
}

impl<'a> Executor<'a> {
    /// Create executor
    #[inline]
    #[must_use]
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    fn editor<'f>(&self, field: &'f str, resolution: &'f FieldResolution) -> FieldEditor<'f> {
        FieldEditor::new(field, resolution, self.settings.purge, self.settings.adapter)
    }

    /// Apply the member edits of `action` to `list`
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError::Precondition`] when an editor refuses.
    pub fn edit(&self, list: &mut MemberList, action: &Action) -> Result<bool, ExecuteError> {
        let changed = match action {
            Action::ApplyHistory { fields } => {
                let mut changed = false;
                for (field, resolution) in fields {
                    changed |= self.editor(field, resolution).build(list)?;
                }
                changed
            }
            Action::NewKey { name, resolution } | Action::ReAdd { name, resolution } => {
                self.editor(name, resolution).build(list)?
            }
            Action::Rename {
                old_name,
                old_resolution,
                new_name,
                new_resolution,
            } => self
                .editor(old_name, old_resolution)
                .change(list, new_name, new_resolution)?,
            Action::RemoveClean { name, resolution } => {
                self.editor(name, resolution).purge(list) > 0
            }
            Action::RemoveAsIs { .. } => false,
        };
        tracing::debug!(action = %action, changed, "applied member edits");
        Ok(changed)
    }

    /// Execute `action` against `class` of `file`, then record it in `history`
    ///
    /// # Errors
    ///
    /// Returns the first failing step; nothing is changed in that case.
    pub fn execute(
        &self,
        file: &mut SourceFile,
        class: &str,
        action: &Action,
        history: &mut HistoryStore,
    ) -> Result<Outcome, ExecuteError> {
        tracing::info!(class, action = %action, "executing");
        let mut outcome = Outcome::default();

        if action.touches_source() {
            let mut staged = file.members(class)?;
            self.edit(&mut staged, action)?;
            let mut rewritten = file.clone();
            if rewritten.replace_class(class, &staged)? {
                if let Err(err) = rewritten.save() {
                    tracing::warn!(class, error = %err, "source write failed, action aborted");
                    return Err(ExecuteError::SourceWrite(err));
                }
                *file = rewritten;
                outcome.source_changed = true;
            }
        }

        if action.touches_history() {
            let mut next = history.clone();
            next.record(class, action);
            if let Err(err) = next.save() {
                tracing::warn!(class, error = %err, "history write failed, action aborted");
                return Err(ExecuteError::HistoryWrite(err));
            }
            *history = next;
            outcome.history_changed = true;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csfe_model::FacetResolution;
    use csfe_test_utils::{fixed_content_type, DOCUMENT_MODEL};
    use indexmap::IndexMap;

    fn new_key(resolution: FieldResolution) -> Action {
        Action::NewKey {
            name: "file".into(),
            resolution,
        }
    }

    #[test]
    fn new_key_edits_source_and_records_history() {
        let settings = Settings::default();
        let mut file = SourceFile::from_text(DOCUMENT_MODEL);
        let mut history = HistoryStore::in_memory();
        let action = new_key(fixed_content_type("application/pdf"));

        let outcome = Executor::new(&settings)
            .execute(&mut file, "Document", &action, &mut history)
            .unwrap();
        assert!(outcome.source_changed);
        assert!(outcome.history_changed);
        assert!(file
            .text()
            .contains("file_content_type: ClassVar[str] = 'application/pdf'"));
        assert!(history.contains("Document", "file"));
    }

    #[test]
    fn apply_history_never_writes_history() {
        let settings = Settings::default();
        let mut file = SourceFile::from_text(DOCUMENT_MODEL);
        let mut history = HistoryStore::in_memory();
        let mut fields = IndexMap::new();
        fields.insert("file".to_string(), FieldResolution::FullyUnhandled);

        let outcome = Executor::new(&settings)
            .execute(&mut file, "Document", &Action::ApplyHistory { fields }, &mut history)
            .unwrap();
        assert_eq!(outcome, Outcome::default());
        assert_eq!(file.text(), DOCUMENT_MODEL);
        assert!(history.tree().is_empty());
    }

    #[test]
    fn refused_edit_changes_nothing() {
        let settings = Settings::default();
        let source = DOCUMENT_MODEL.replace(
            "    title: Mapped[str]",
            "    file_sync_file: Mapped[str] = mapped_column(String)\n    title: Mapped[str]",
        );
        let mut file = SourceFile::from_text(source.clone());
        let mut history = HistoryStore::in_memory();
        let action = new_key(FieldResolution::new(
            FacetResolution::Fixed("image/png".into()),
            FacetResolution::Unhandled,
        ));

        let err = Executor::new(&settings)
            .execute(&mut file, "Document", &action, &mut history)
            .unwrap_err();
        assert!(matches!(err, ExecuteError::Precondition(_)));
        assert_eq!(file.text(), source);
        assert!(history.tree().is_empty());
    }

    #[test]
    fn remove_as_is_only_touches_history() {
        let settings = Settings::default();
        let mut file = SourceFile::from_text(DOCUMENT_MODEL);
        let mut history = HistoryStore::in_memory();
        history.insert("Document", "old", &FieldResolution::FullyUnhandled);

        let outcome = Executor::new(&settings)
            .execute(
                &mut file,
                "Document",
                &Action::RemoveAsIs { name: "old".into() },
                &mut history,
            )
            .unwrap();
        assert!(!outcome.source_changed);
        assert!(outcome.history_changed);
        assert!(!history.contains("Document", "old"));
    }
}
