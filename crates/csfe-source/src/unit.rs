//! Source units
//!
//! A [`SourceFile`] is the whole text of one Python module, optionally bound
//! to a path. Classes are re-parsed on demand and a rewritten class body is
//! spliced back into the text, leaving every other byte as it was.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::list::MemberList;
use crate::parse::{parse_classes, ParsedClass};
use crate::render::render_body;

/// Python module text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: Option<PathBuf>,
    text: String,
}

impl SourceFile {
    /// Read a module from disk
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] when the file cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|e| SourceError::io_error(&path, e))?;
        Ok(Self {
            path: Some(path),
            text,
        })
    }

    /// Module held only in memory; [`save`](Self::save) is a no-op
    #[inline]
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            path: None,
            text: text.into(),
        }
    }

    /// Backing path, if any
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Label used in diagnostics
    #[must_use]
    pub fn origin(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
    }

    /// Every top-level class
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Syntax`] when the module does not parse.
    pub fn classes(&self) -> Result<Vec<ParsedClass>, SourceError> {
        parse_classes(&self.text, &self.origin())
    }

    fn locate(&self, class: &str) -> Result<ParsedClass, SourceError> {
        self.classes()?
            .into_iter()
            .find(|parsed| parsed.name == class)
            .ok_or_else(|| SourceError::class_not_found(class, self.origin()))
    }

    /// Members of one class
    ///
    /// # Errors
    ///
    /// Returns an error when the module does not parse or lacks the class.
    pub fn members(&self, class: &str) -> Result<MemberList, SourceError> {
        Ok(self.locate(class)?.members)
    }

    /// Splice a rewritten body for `class`; returns whether the text changed
    ///
    /// # Errors
    ///
    /// Returns an error when the module does not parse or lacks the class.
    pub fn replace_class(&mut self, class: &str, members: &MemberList) -> Result<bool, SourceError> {
        let parsed = self.locate(class)?;
        let body = render_body(members);
        let replacement = if parsed.inline {
            format!("\n{}{body}", members.indent())
        } else {
            body
        };
        if self.text[parsed.region.clone()] == replacement {
            return Ok(false);
        }
        self.text.replace_range(parsed.region, &replacement);
        tracing::debug!(class, origin = %self.origin(), "rewrote class body");
        Ok(true)
    }

    /// Write the text back to the backing path
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] when the write fails.
    pub fn save(&self) -> Result<(), SourceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        fs::write(path, &self.text).map_err(|e| SourceError::io_error(path, e))?;
        tracing::debug!(path = %path.display(), "saved source");
        Ok(())
    }
}
