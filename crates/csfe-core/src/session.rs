//! Per-class reconciliation loop
//!
//! A [`Session`] resolves and executes actions for one class until history
//! is applied. Aborted selections are asked again; every other error ends the
//! class. A field re-added during the loop is not offered again until the
//! next run.

use csfe_model::{Action, ActionKind, HistoryStore};
use csfe_source::{binary_fields, string_columns, SourceFile};
use serde::Serialize;

use crate::error::{ClassError, ResolveError};
use crate::executor::Executor;
use crate::prompt::Prompt;
use crate::resolver::Resolver;
use crate::settings::Settings;

/// Result of reconciling one class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassReport {
    /// Class name
    pub class: String,
    /// Executed actions, in order
    pub actions: Vec<ActionKind>,
    /// Source was rewritten at least once
    pub source_changed: bool,
    /// Class has neither binary fields nor history
    pub skipped: bool,
    /// Selections aborted and asked again
    pub aborts: usize,
}

/// Resolver, executor and prompt bound together for a run
pub struct Session<'a> {
    settings: &'a Settings,
    prompt: &'a mut dyn Prompt,
    history: &'a mut HistoryStore,
}

impl<'a> Session<'a> {
    /// Create session
    pub fn new(
        settings: &'a Settings,
        prompt: &'a mut dyn Prompt,
        history: &'a mut HistoryStore,
    ) -> Self {
        Self {
            settings,
            prompt,
            history,
        }
    }

    /// History as updated so far
    #[inline]
    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &*self.history
    }

    /// Reconcile `class` of `file` until its history is applied
    ///
    /// # Errors
    ///
    /// Returns the first non-recoverable resolver, executor or source error.
    pub fn reconcile(&mut self, file: &mut SourceFile, class: &str) -> Result<ClassReport, ClassError> {
        let mut report = ClassReport {
            class: class.to_string(),
            ..ClassReport::default()
        };
        let executor = Executor::new(self.settings);

        if binary_fields(&file.members(class)?).is_empty() && self.history.class(class).is_none() {
            tracing::debug!(class, "no binary field, skipping");
            report.skipped = true;
            return Ok(report);
        }

        let mut readded: Vec<String> = Vec::new();
        loop {
            let members = file.members(class)?;
            let live = binary_fields(&members);
            let strings = string_columns(&members);
            let resolver =
                Resolver::new(class, &live, &strings, &*self.history)?.with_readded(&readded);
            let action = match resolver.next_action(&mut *self.prompt) {
                Ok(action) => action,
                Err(ResolveError::SelectionAborted) => {
                    tracing::info!(class, "selection aborted");
                    report.aborts += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let outcome = executor.execute(file, class, &action, &mut *self.history)?;
            report.actions.push(action.kind());
            report.source_changed |= outcome.source_changed;
            if action.is_terminal() {
                return Ok(report);
            }
            if let Action::ReAdd { name, .. } = action {
                readded.push(name);
            }
        }
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("settings", &self.settings)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}
