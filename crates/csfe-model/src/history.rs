//! Resolution history
//!
//! Persisted tree of `class -> field -> record`. A record stores one key per
//! facet resolution plus the fully-unhandled flag; absent keys mean the facet
//! has not been resolved yet. The tree is kept in insertion order so the YAML
//! file diffs cleanly between runs.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::resolution::{Facet, FacetResolution, FieldResolution};

/// Records of one class keyed by field name
pub type ClassHistory = IndexMap<String, FieldRecord>;

/// Records of every class keyed by class name
pub type HistoryTree = IndexMap<String, ClassHistory>;

/// Errors reading, decoding or writing history
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// History file could not be read or written
    #[error("history io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// History file is not valid YAML for the expected tree
    #[error("invalid history file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A record carries keys that contradict each other
    #[error("conflicting history record for {class}.{field}: {detail}")]
    Conflict {
        class: String,
        field: String,
        detail: String,
    },
}

impl HistoryError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create conflict error for a record
    pub fn conflict(
        class: impl Into<String>,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            class: class.into(),
            field: field.into(),
            detail: detail.into(),
        }
    }

    /// Whether the history file itself is inconsistent, as opposed to unreachable
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Yaml { .. })
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// Persisted resolution of one field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Fixed content type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type_fixed: Option<String>,
    /// Column holding the content type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type_reference: Option<String>,
    /// Content type left unhandled
    #[serde(default, skip_serializing_if = "is_false")]
    pub content_type_unhandled: bool,
    /// Fixed display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_fixed: Option<String>,
    /// Column holding the display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_reference: Option<String>,
    /// Display name left unhandled
    #[serde(default, skip_serializing_if = "is_false")]
    pub display_name_unhandled: bool,
    /// No member is generated for the field
    #[serde(default, skip_serializing_if = "is_false")]
    pub fully_unhandled: bool,
}

/// Decoded state of a [`FieldRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordState {
    /// Every facet is resolved
    Resolved(FieldResolution),
    /// At least one facet still needs a decision
    Partial {
        /// Content type, if decided
        content_type: Option<FacetResolution>,
        /// Display name, if decided
        display_name: Option<FacetResolution>,
    },
}

impl RecordState {
    /// Full resolution, if complete
    #[inline]
    #[must_use]
    pub fn resolved(&self) -> Option<&FieldResolution> {
        match self {
            Self::Resolved(resolution) => Some(resolution),
            Self::Partial { .. } => None,
        }
    }

    /// Known resolution of one facet
    #[must_use]
    pub fn facet(&self, facet: Facet) -> Option<&FacetResolution> {
        match (self, facet) {
            (Self::Resolved(resolution), _) => Some(resolution.facet(facet)),
            (Self::Partial { content_type, .. }, Facet::ContentType) => content_type.as_ref(),
            (Self::Partial { display_name, .. }, Facet::DisplayName) => display_name.as_ref(),
        }
    }
}

impl FieldRecord {
    /// Encode a resolution
    #[must_use]
    pub fn from_resolution(resolution: &FieldResolution) -> Self {
        let mut record = Self::default();
        if resolution.is_fully_unhandled() {
            record.fully_unhandled = true;
            return record;
        }
        for facet in Facet::ALL {
            let (fixed, reference, unhandled) = record.slots_mut(facet);
            match resolution.facet(facet) {
                FacetResolution::Unhandled => *unhandled = true,
                FacetResolution::Fixed(value) => *fixed = Some(value.clone()),
                FacetResolution::Reference(column) => *reference = Some(column.clone()),
            }
        }
        record
    }

    fn slots_mut(
        &mut self,
        facet: Facet,
    ) -> (&mut Option<String>, &mut Option<String>, &mut bool) {
        match facet {
            Facet::ContentType => (
                &mut self.content_type_fixed,
                &mut self.content_type_reference,
                &mut self.content_type_unhandled,
            ),
            Facet::DisplayName => (
                &mut self.display_name_fixed,
                &mut self.display_name_reference,
                &mut self.display_name_unhandled,
            ),
        }
    }

    fn slots(&self, facet: Facet) -> (Option<&str>, Option<&str>, bool) {
        match facet {
            Facet::ContentType => (
                self.content_type_fixed.as_deref(),
                self.content_type_reference.as_deref(),
                self.content_type_unhandled,
            ),
            Facet::DisplayName => (
                self.display_name_fixed.as_deref(),
                self.display_name_reference.as_deref(),
                self.display_name_unhandled,
            ),
        }
    }

    fn decode_facet(
        &self,
        class: &str,
        field: &str,
        facet: Facet,
    ) -> Result<Option<FacetResolution>, HistoryError> {
        match self.slots(facet) {
            (None, None, false) => Ok(None),
            (Some(value), None, false) => Ok(Some(FacetResolution::Fixed(value.to_string()))),
            (None, Some(column), false) => Ok(Some(FacetResolution::Reference(column.to_string()))),
            (None, None, true) => Ok(Some(FacetResolution::Unhandled)),
            _ => Err(HistoryError::conflict(
                class,
                field,
                format!("{} is resolved more than once", facet.label()),
            )),
        }
    }

    /// Decode into a resolution, rejecting contradictory keys
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Conflict`] when a facet carries more than one
    /// resolution or when the fully-unhandled flag sits next to facet keys.
    pub fn decode(&self, class: &str, field: &str) -> Result<RecordState, HistoryError> {
        let content_type = self.decode_facet(class, field, Facet::ContentType)?;
        let display_name = self.decode_facet(class, field, Facet::DisplayName)?;

        if self.fully_unhandled {
            if content_type.is_some() || display_name.is_some() {
                return Err(HistoryError::conflict(
                    class,
                    field,
                    "fully unhandled record also resolves a facet",
                ));
            }
            return Ok(RecordState::Resolved(FieldResolution::FullyUnhandled));
        }

        Ok(match (content_type, display_name) {
            (Some(content_type), Some(display_name)) => {
                RecordState::Resolved(FieldResolution::new(content_type, display_name))
            }
            (content_type, display_name) => RecordState::Partial {
                content_type,
                display_name,
            },
        })
    }
}

/// History tree bound to an optional backing file
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    path: Option<PathBuf>,
    tree: HistoryTree,
}

impl HistoryStore {
    /// Load history from `path`, creating an empty file when missing
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or created, or when it is
    /// not a valid history tree.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        if !path.exists() {
            tracing::info!(path = %path.display(), "creating history file");
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| HistoryError::io_error(parent, e))?;
            }
            fs::write(&path, "").map_err(|e| HistoryError::io_error(&path, e))?;
            return Ok(Self {
                path: Some(path),
                tree: HistoryTree::new(),
            });
        }

        let text = fs::read_to_string(&path).map_err(|e| HistoryError::io_error(&path, e))?;
        let tree = Self::parse(&text).map_err(|source| HistoryError::Yaml {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), classes = tree.len(), "loaded history");
        Ok(Self {
            path: Some(path),
            tree,
        })
    }

    /// History with no backing file; [`save`](Self::save) is a no-op
    #[inline]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// In-memory history seeded with a tree
    #[inline]
    #[must_use]
    pub fn from_tree(tree: HistoryTree) -> Self {
        Self { path: None, tree }
    }

    fn parse(text: &str) -> Result<HistoryTree, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(HistoryTree::new());
        }
        let tree: Option<HistoryTree> = serde_yaml::from_str(text)?;
        Ok(tree.unwrap_or_default())
    }

    /// Backing file, if any
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whole tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &HistoryTree {
        &self.tree
    }

    /// Records of one class
    #[inline]
    #[must_use]
    pub fn class(&self, class: &str) -> Option<&ClassHistory> {
        self.tree.get(class)
    }

    /// Field names recorded for a class, in record order
    #[must_use]
    pub fn fields(&self, class: &str) -> Vec<String> {
        self.class(class)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a field is recorded
    #[inline]
    #[must_use]
    pub fn contains(&self, class: &str, field: &str) -> bool {
        self.class(class).is_some_and(|records| records.contains_key(field))
    }

    /// Decode every record of a class
    ///
    /// # Errors
    ///
    /// Returns the first [`HistoryError::Conflict`] found.
    pub fn decode_class(&self, class: &str) -> Result<IndexMap<String, RecordState>, HistoryError> {
        let Some(records) = self.class(class) else {
            return Ok(IndexMap::new());
        };
        records
            .iter()
            .map(|(field, record)| Ok((field.clone(), record.decode(class, field)?)))
            .collect()
    }

    /// Insert or replace a field record
    pub fn insert(&mut self, class: &str, field: &str, resolution: &FieldResolution) {
        self.tree
            .entry(class.to_string())
            .or_default()
            .insert(field.to_string(), FieldRecord::from_resolution(resolution));
    }

    /// Remove a field record; an emptied class is dropped
    pub fn remove(&mut self, class: &str, field: &str) -> bool {
        let Some(records) = self.tree.get_mut(class) else {
            return false;
        };
        let removed = records.shift_remove(field).is_some();
        if records.is_empty() {
            self.tree.shift_remove(class);
        }
        removed
    }

    /// Replace the key `old` with `new` carrying `resolution`
    pub fn rename(&mut self, class: &str, old: &str, new: &str, resolution: &FieldResolution) {
        let records = self.tree.entry(class.to_string()).or_default();
        records.shift_remove(old);
        records.insert(new.to_string(), FieldRecord::from_resolution(resolution));
    }

    /// Apply the history side of an executed action
    pub fn record(&mut self, class: &str, action: &Action) {
        match action {
            Action::ApplyHistory { .. } => {}
            Action::NewKey { name, resolution } | Action::ReAdd { name, resolution } => {
                self.insert(class, name, resolution);
            }
            Action::Rename {
                old_name,
                new_name,
                new_resolution,
                ..
            } => self.rename(class, old_name, new_name, new_resolution),
            Action::RemoveAsIs { name } | Action::RemoveClean { name, .. } => {
                self.remove(class, name);
            }
        }
    }

    /// Write the tree back to the backing file
    ///
    /// # Errors
    ///
    /// Returns an error when serialisation or the write fails.
    pub fn save(&self) -> Result<(), HistoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = serde_yaml::to_string(&self.tree).map_err(|source| HistoryError::Yaml {
            path: path.clone(),
            source,
        })?;
        fs::write(path, text).map_err(|e| HistoryError::io_error(path, e))?;
        tracing::debug!(path = %path.display(), "saved history");
        Ok(())
    }
}
