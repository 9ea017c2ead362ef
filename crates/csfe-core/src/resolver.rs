//! Drift resolution
//!
//! The [`Resolver`] compares the live binary fields of one class with its
//! history and settles exactly one [`Action`] per call:
//!
//! 1. the first new field is resolved as a rename or a new key
//! 2. the first field with a partial record is completed
//! 3. the first missing field gets a disposition (`re_add`, `clean`, `as_is`);
//!    fields already re-added during the run are not asked again
//! 4. otherwise history is applied as recorded
//!
//! Aborting any enumeration returns [`ResolveError::SelectionAborted`]; no
//! state is touched before an action is returned.

use std::collections::HashSet;

use csfe_model::{naming, Action, Facet, FacetResolution, FieldResolution, HistoryStore, RecordState};
use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::prompt::{choose, confirm, pick, text, Prompt};

/// Answers accepted for a facet disposition
const DISPOSITIONS: [&str; 4] = ["static", "dynamic", "unhandled", "x"];

/// Answers accepted for a missing field
const MISSING: [&str; 3] = ["re_add", "clean", "as_is"];

/// Resolution recorded for a field, with unknown facets read as unhandled
fn settled(state: &RecordState) -> FieldResolution {
    match state {
        RecordState::Resolved(resolution) => resolution.clone(),
        RecordState::Partial {
            content_type,
            display_name,
        } => FieldResolution::new(
            content_type.clone().unwrap_or(FacetResolution::Unhandled),
            display_name.clone().unwrap_or(FacetResolution::Unhandled),
        ),
    }
}

/// Decision state machine for one class
#[derive(Debug)]
pub struct Resolver<'a> {
    class: &'a str,
    live: &'a [String],
    strings: &'a [String],
    readded: &'a [String],
    records: IndexMap<String, RecordState>,
}

impl<'a> Resolver<'a> {
    /// Create resolver over the live binary fields and string columns
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::History`] when a record contradicts itself.
    pub fn new(
        class: &'a str,
        live: &'a [String],
        strings: &'a [String],
        history: &HistoryStore,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            class,
            live,
            strings,
            readded: &[],
            records: history.decode_class(class)?,
        })
    }

    /// Fields re-added earlier in the run; they no longer count as missing
    #[inline]
    #[must_use]
    pub fn with_readded(mut self, readded: &'a [String]) -> Self {
        self.readded = readded;
        self
    }

    /// Live fields absent from history
    #[must_use]
    pub fn new_fields(&self) -> Vec<&str> {
        self.live
            .iter()
            .filter(|field| !self.records.contains_key(field.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Recorded fields no longer declared
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&str> {
        self.records
            .keys()
            .filter(|field| !self.live.contains(*field) && !self.readded.contains(*field))
            .map(String::as_str)
            .collect()
    }

    /// String columns a field may reference for `facet`
    ///
    /// Columns already referenced by another field's same-facet resolution
    /// are left out. `renamed_from` is not another field.
    #[must_use]
    pub fn candidates(&self, field: &str, facet: Facet, renamed_from: Option<&str>) -> Vec<String> {
        let taken: HashSet<&str> = self
            .records
            .iter()
            .filter(|(name, _)| name.as_str() != field && Some(name.as_str()) != renamed_from)
            .filter_map(|(_, state)| state.facet(facet).and_then(FacetResolution::reference))
            .collect();
        self.strings
            .iter()
            .filter(|column| !taken.contains(column.as_str()))
            .cloned()
            .collect()
    }

    /// Settle the next action
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::SelectionAborted`] when the user aborts and
    /// prompt errors when no answer can be read.
    pub fn next_action(&self, prompt: &mut dyn Prompt) -> Result<Action, ResolveError> {
        if let Some(field) = self.new_fields().first().copied() {
            return self.resolve_new(prompt, field);
        }

        let partial = self
            .records
            .iter()
            .find(|(field, state)| self.live.contains(*field) && state.resolved().is_none());
        if let Some((field, state)) = partial {
            return self.complete(prompt, field, state);
        }

        if let Some(field) = self.missing_fields().first().copied() {
            return self.resolve_missing(prompt, field);
        }

        let fields = self
            .live
            .iter()
            .map(|field| {
                self.records
                    .get(field)
                    .and_then(RecordState::resolved)
                    .map(|resolution| (field.clone(), resolution.clone()))
                    .ok_or_else(|| {
                        ResolveError::invariant(self.class, format!("'{field}' left unresolved"))
                    })
            })
            .collect::<Result<IndexMap<_, _>, _>>()?;
        Ok(Action::ApplyHistory { fields })
    }

    fn resolve_new(&self, prompt: &mut dyn Prompt, field: &str) -> Result<Action, ResolveError> {
        tracing::info!(class = self.class, field, "new binary field");
        let is_rename = confirm(
            prompt,
            &format!(
                "Is '{field}' on {} a rename of a field that is no longer declared?",
                self.class
            ),
        )?;
        if !is_rename {
            let resolution = self.resolve_field(prompt, field, None)?;
            return Ok(Action::NewKey {
                name: field.to_string(),
                resolution,
            });
        }

        let missing: Vec<String> = self.missing_fields().into_iter().map(str::to_string).collect();
        if missing.is_empty() {
            prompt.say(&format!("No field of {} is missing from the class.", self.class))?;
            return Err(ResolveError::SelectionAborted);
        }
        let Some(old) = pick(prompt, &format!("Which field was renamed to '{field}'?"), &missing)?
        else {
            return Err(ResolveError::SelectionAborted);
        };
        let old_state = self
            .records
            .get(old)
            .ok_or_else(|| ResolveError::invariant(self.class, format!("'{old}' is not recorded")))?;
        let old_resolution = settled(old_state);
        let new_resolution = self.resolve_rename(prompt, field, old, old_state)?;
        Ok(Action::Rename {
            old_name: old.to_string(),
            old_resolution,
            new_name: field.to_string(),
            new_resolution,
        })
    }

    fn resolve_rename(
        &self,
        prompt: &mut dyn Prompt,
        field: &str,
        old: &str,
        old_state: &RecordState,
    ) -> Result<FieldResolution, ResolveError> {
        if old_state.resolved().is_some_and(FieldResolution::is_fully_unhandled) {
            if confirm(prompt, &format!("'{old}' was fully unhandled. Keep '{field}' fully unhandled?"))? {
                return Ok(FieldResolution::FullyUnhandled);
            }
            let content_type = self.resolve_facet(prompt, field, Facet::ContentType, Some(old))?;
            let display_name = self.resolve_facet(prompt, field, Facet::DisplayName, Some(old))?;
            return Ok(FieldResolution::new(content_type, display_name));
        }

        let mut facets = Vec::with_capacity(2);
        for facet in Facet::ALL {
            let Some(previous) = old_state.facet(facet) else {
                prompt.say(&format!("'{old}' has no {} resolution yet.", facet.label()))?;
                facets.push(self.resolve_facet(prompt, field, facet, Some(old))?);
                continue;
            };
            let keep = confirm(
                prompt,
                &format!("Keep the {} resolution of '{old}' ({previous}) for '{field}'?", facet.label()),
            )?;
            facets.push(if keep {
                previous.clone()
            } else {
                self.resolve_facet(prompt, field, facet, Some(old))?
            });
        }
        let display_name = facets.pop().unwrap_or(FacetResolution::Unhandled);
        let content_type = facets.pop().unwrap_or(FacetResolution::Unhandled);
        Ok(FieldResolution::new(content_type, display_name))
    }

    fn resolve_field(
        &self,
        prompt: &mut dyn Prompt,
        field: &str,
        renamed_from: Option<&str>,
    ) -> Result<FieldResolution, ResolveError> {
        if confirm(prompt, &format!("Keep '{field}' fully unhandled?"))? {
            return Ok(FieldResolution::FullyUnhandled);
        }
        let content_type = self.resolve_facet(prompt, field, Facet::ContentType, renamed_from)?;
        let display_name = self.resolve_facet(prompt, field, Facet::DisplayName, renamed_from)?;
        Ok(FieldResolution::new(content_type, display_name))
    }

    fn resolve_facet(
        &self,
        prompt: &mut dyn Prompt,
        field: &str,
        facet: Facet,
        renamed_from: Option<&str>,
    ) -> Result<FacetResolution, ResolveError> {
        let disposition = choose(
            prompt,
            &format!("How is the {} of '{field}' resolved? (x aborts)", facet.label()),
            &DISPOSITIONS,
        )?;
        match disposition.as_str() {
            "static" => {
                let value = text(
                    prompt,
                    &format!(
                        "Fixed {} for '{field}'. Hit enter for default ({}):",
                        facet.label(),
                        facet.default_literal()
                    ),
                )?;
                let value = if value.is_empty() {
                    facet.default_literal().to_string()
                } else {
                    value
                };
                Ok(FacetResolution::Fixed(value))
            }
            "dynamic" => self.resolve_reference(prompt, field, facet, renamed_from),
            "unhandled" => Ok(FacetResolution::Unhandled),
            _ => Err(ResolveError::SelectionAborted),
        }
    }

    fn resolve_reference(
        &self,
        prompt: &mut dyn Prompt,
        field: &str,
        facet: Facet,
        renamed_from: Option<&str>,
    ) -> Result<FacetResolution, ResolveError> {
        let select = confirm(
            prompt,
            &format!("Select an existing column for the {} of '{field}'?", facet.label()),
        )?;
        if select {
            let candidates = self.candidates(field, facet, renamed_from);
            if candidates.is_empty() {
                prompt.say(&format!("No free string column on {}.", self.class))?;
            } else {
                return match pick(prompt, &format!("Column holding the {}:", facet.label()), &candidates)? {
                    Some(column) => Ok(FacetResolution::Reference(column.to_string())),
                    None => Err(ResolveError::SelectionAborted),
                };
            }
        }

        let default = naming::default_column(field, facet);
        let question = format!(
            "Name of the new {} column. Hit enter for default ({default}), x aborts:",
            facet.label()
        );
        loop {
            let name = text(prompt, &question)?;
            if name.eq_ignore_ascii_case("x") {
                return Err(ResolveError::SelectionAborted);
            }
            let column = if name.is_empty() {
                default.clone()
            } else {
                name.split_whitespace().collect::<Vec<_>>().join("_")
            };
            if naming::is_identifier(&column) {
                return Ok(FacetResolution::Reference(column));
            }
            prompt.say(&format!("'{column}' is not a valid column name."))?;
        }
    }

    fn complete(
        &self,
        prompt: &mut dyn Prompt,
        field: &str,
        state: &RecordState,
    ) -> Result<Action, ResolveError> {
        tracing::info!(class = self.class, field, "completing partial record");
        let mut facets = Vec::with_capacity(2);
        for facet in Facet::ALL {
            facets.push(match state.facet(facet) {
                Some(known) => known.clone(),
                None => {
                    prompt.say(&format!("'{field}' has no {} resolution yet.", facet.label()))?;
                    self.resolve_facet(prompt, field, facet, None)?
                }
            });
        }
        let display_name = facets.pop().unwrap_or(FacetResolution::Unhandled);
        let content_type = facets.pop().unwrap_or(FacetResolution::Unhandled);
        Ok(Action::NewKey {
            name: field.to_string(),
            resolution: FieldResolution::new(content_type, display_name),
        })
    }

    fn resolve_missing(&self, prompt: &mut dyn Prompt, field: &str) -> Result<Action, ResolveError> {
        tracing::info!(class = self.class, field, "recorded field is missing");
        let state = self
            .records
            .get(field)
            .ok_or_else(|| ResolveError::invariant(self.class, format!("'{field}' is not recorded")))?;
        if self.live.iter().any(|live| live == field) {
            return Err(ResolveError::invariant(
                self.class,
                format!("'{field}' is missing and declared at once"),
            ));
        }
        let disposition = choose(
            prompt,
            &format!(
                "'{field}' is recorded for {} but no longer declared. Re-add it, clean its members, or forget it as is?",
                self.class
            ),
            &MISSING,
        )?;
        let name = field.to_string();
        Ok(match disposition.as_str() {
            "re_add" => Action::ReAdd {
                name,
                resolution: settled(state),
            },
            "clean" => Action::RemoveClean {
                name,
                resolution: settled(state),
            },
            _ => Action::RemoveAsIs { name },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use pretty_assertions::assert_eq;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    fn history(yaml: &str) -> HistoryStore {
        HistoryStore::from_tree(tree_from_yaml(yaml))
    }

    fn tree_from_yaml(yaml: &str) -> csfe_model::HistoryTree {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.yaml");
        std::fs::write(&path, yaml).unwrap();
        HistoryStore::open(&path).unwrap().tree().clone()
    }

    #[test]
    fn classifies_new_and_missing() {
        let live = strings(&["file", "thumb"]);
        let columns = strings(&[]);
        let store = history("Blob:\n  thumb:\n    fully_unhandled: true\n  old:\n    fully_unhandled: true\n");
        let resolver = Resolver::new("Blob", &live, &columns, &store).unwrap();
        assert_eq!(resolver.new_fields(), ["file"]);
        assert_eq!(resolver.missing_fields(), ["old"]);
    }

    #[test]
    fn candidates_skip_other_fields_references() {
        let live = strings(&["file", "thumb"]);
        let columns = strings(&["title", "mime", "label"]);
        let store = history(
            "Blob:\n  thumb:\n    content_type_reference: mime\n    display_name_reference: title\n",
        );
        let resolver = Resolver::new("Blob", &live, &columns, &store).unwrap();
        assert_eq!(
            resolver.candidates("file", Facet::ContentType, None),
            strings(&["title", "label"])
        );
        assert_eq!(
            resolver.candidates("file", Facet::DisplayName, None),
            strings(&["mime", "label"])
        );
        assert_eq!(
            resolver.candidates("file", Facet::ContentType, Some("thumb")),
            columns
        );
    }

    #[test]
    fn selects_existing_column() {
        let live = strings(&["file"]);
        let columns = strings(&["title", "mime"]);
        let store = HistoryStore::in_memory();
        let resolver = Resolver::new("Doc", &live, &columns, &store).unwrap();
        let mut prompt =
            ScriptedPrompt::from_lines(["n", "n", "dynamic", "y", "2", "dynamic", "y", "1"]);
        let action = resolver.next_action(&mut prompt).unwrap();
        assert_eq!(
            action,
            Action::NewKey {
                name: "file".into(),
                resolution: FieldResolution::new(
                    FacetResolution::Reference("mime".into()),
                    FacetResolution::Reference("title".into()),
                ),
            }
        );
    }

    #[test]
    fn select_without_candidates_creates() {
        let live = strings(&["file"]);
        let columns = strings(&[]);
        let store = HistoryStore::in_memory();
        let resolver = Resolver::new("Doc", &live, &columns, &store).unwrap();
        let mut prompt = ScriptedPrompt::from_lines(["n", "n", "dynamic", "y", "file mime", "unhandled"]);
        let Action::NewKey { resolution, .. } = resolver.next_action(&mut prompt).unwrap() else {
            panic!("expected new key");
        };
        assert_eq!(resolution.reference(Facet::ContentType), Some("file_mime"));
    }

    #[test]
    fn aborts_are_recoverable() {
        let live = strings(&["file"]);
        let columns = strings(&["title"]);
        let store = HistoryStore::in_memory();
        let resolver = Resolver::new("Doc", &live, &columns, &store).unwrap();

        for answers in [
            vec!["n", "n", "x"],
            vec!["n", "n", "dynamic", "y", "x"],
            vec!["n", "n", "dynamic", "n", "X"],
            vec!["y"],
        ] {
            let mut prompt = ScriptedPrompt::from_lines(answers);
            assert!(matches!(
                resolver.next_action(&mut prompt),
                Err(ResolveError::SelectionAborted)
            ));
        }
    }

    #[test]
    fn partial_record_is_completed() {
        let live = strings(&["file"]);
        let columns = strings(&[]);
        let store = history("Doc:\n  file:\n    content_type_fixed: image/png\n");
        let resolver = Resolver::new("Doc", &live, &columns, &store).unwrap();
        let mut prompt = ScriptedPrompt::from_lines(["static", ""]);
        assert_eq!(
            resolver.next_action(&mut prompt).unwrap(),
            Action::NewKey {
                name: "file".into(),
                resolution: FieldResolution::new(
                    FacetResolution::Fixed("image/png".into()),
                    FacetResolution::Fixed("binary.file".into()),
                ),
            }
        );
    }

    #[test]
    fn missing_field_dispositions() {
        let live = strings(&[]);
        let columns = strings(&[]);
        let store = history("Doc:\n  old:\n    content_type_fixed: text/plain\n    display_name_unhandled: true\n");
        let resolver = Resolver::new("Doc", &live, &columns, &store).unwrap();
        let recorded = FieldResolution::new(
            FacetResolution::Fixed("text/plain".into()),
            FacetResolution::Unhandled,
        );

        let mut prompt = ScriptedPrompt::from_lines(["RE_ADD", "clean", "as_is"]);
        assert_eq!(
            resolver.next_action(&mut prompt).unwrap(),
            Action::ReAdd {
                name: "old".into(),
                resolution: recorded.clone(),
            }
        );
        assert_eq!(
            resolver.next_action(&mut prompt).unwrap(),
            Action::RemoveClean {
                name: "old".into(),
                resolution: recorded,
            }
        );
        assert_eq!(
            resolver.next_action(&mut prompt).unwrap(),
            Action::RemoveAsIs { name: "old".into() }
        );
    }

    #[test]
    fn rename_of_partial_record_resolves_unknown_facet() {
        let live = strings(&["file"]);
        let columns = strings(&[]);
        let store = history("Doc:\n  old:\n    content_type_fixed: image/png\n");
        let resolver = Resolver::new("Doc", &live, &columns, &store).unwrap();
        let mut prompt = ScriptedPrompt::from_lines(["y", "1", "y", "static", ""]);

        assert_eq!(
            resolver.next_action(&mut prompt).unwrap(),
            Action::Rename {
                old_name: "old".into(),
                old_resolution: FieldResolution::new(
                    FacetResolution::Fixed("image/png".into()),
                    FacetResolution::Unhandled,
                ),
                new_name: "file".into(),
                new_resolution: FieldResolution::new(
                    FacetResolution::Fixed("image/png".into()),
                    FacetResolution::Fixed("binary.file".into()),
                ),
            }
        );
        assert!(!prompt
            .transcript()
            .iter()
            .any(|line| line.starts_with("Keep the display name")));
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn invalid_column_name_is_asked_again() {
        let live = strings(&["file"]);
        let columns = strings(&[]);
        let store = HistoryStore::in_memory();
        let resolver = Resolver::new("Doc", &live, &columns, &store).unwrap();
        let mut prompt =
            ScriptedPrompt::from_lines(["n", "n", "dynamic", "n", "my-col", "my_col", "unhandled"]);
        let Action::NewKey { resolution, .. } = resolver.next_action(&mut prompt).unwrap() else {
            panic!("expected new key");
        };
        assert_eq!(resolution.reference(Facet::ContentType), Some("my_col"));
        assert!(prompt
            .transcript()
            .iter()
            .any(|line| line == "'my-col' is not a valid column name."));
    }

    #[test]
    fn readded_field_is_not_missing() {
        let live = strings(&["file"]);
        let columns = strings(&[]);
        let store = history("Doc:\n  file:\n    fully_unhandled: true\n  old:\n    fully_unhandled: true\n");
        let readded = strings(&["old"]);
        let resolver = Resolver::new("Doc", &live, &columns, &store)
            .unwrap()
            .with_readded(&readded);
        assert!(resolver.missing_fields().is_empty());

        let mut prompt = ScriptedPrompt::default();
        let Action::ApplyHistory { fields } = resolver.next_action(&mut prompt).unwrap() else {
            panic!("expected apply history");
        };
        assert_eq!(fields.keys().map(String::as_str).collect::<Vec<_>>(), ["file"]);
        assert!(prompt.transcript().is_empty());
    }

    #[test]
    fn settled_history_is_applied() {
        let live = strings(&["file"]);
        let columns = strings(&[]);
        let store = history("Doc:\n  file:\n    fully_unhandled: true\n");
        let resolver = Resolver::new("Doc", &live, &columns, &store).unwrap();
        let mut prompt = ScriptedPrompt::default();
        let Action::ApplyHistory { fields } = resolver.next_action(&mut prompt).unwrap() else {
            panic!("expected apply history");
        };
        assert_eq!(fields.get("file"), Some(&FieldResolution::FullyUnhandled));
        assert!(prompt.transcript().is_empty());
    }

    #[test]
    fn conflicting_record_is_rejected() {
        let live = strings(&["file"]);
        let columns = strings(&[]);
        let store = history(
            "Doc:\n  file:\n    content_type_fixed: a/b\n    content_type_unhandled: true\n",
        );
        assert!(matches!(
            Resolver::new("Doc", &live, &columns, &store),
            Err(ResolveError::History(_))
        ));
    }
}
