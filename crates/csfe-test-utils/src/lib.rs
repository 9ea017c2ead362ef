//! Testing utilities for the csfe workspace
//!
//! Shared model fixtures, resolution builders and an on-disk workspace.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use std::fs;
use std::path::{Path, PathBuf};

use csfe_model::{FacetResolution, FieldResolution};
use csfe_source::{MemberList, SourceFile};
use tempfile::TempDir;

/// Declarative model with one binary field and one string column
pub const DOCUMENT_MODEL: &str = "\
from typing import ClassVar

from sqlalchemy import LargeBinary, String
from sqlalchemy.orm import Mapped, mapped_column


class Document(Base):
    __tablename__ = 'documents'

    id: Mapped[int] = mapped_column(primary_key=True)
    file: Mapped[bytes] = mapped_column(LargeBinary)
    title: Mapped[str] = mapped_column(String(200))

    def describe(self) -> str:
        return self.title
";

/// Members of `class` in `source`
pub fn class_members(source: &str, class: &str) -> MemberList {
    SourceFile::from_text(source).members(class).unwrap()
}

/// Members of `Document` in [`DOCUMENT_MODEL`]
pub fn document_members() -> MemberList {
    class_members(DOCUMENT_MODEL, "Document")
}

/// `Fixed(content_type)` / `Unhandled`
pub fn fixed_content_type(value: &str) -> FieldResolution {
    FieldResolution::new(FacetResolution::Fixed(value.into()), FacetResolution::Unhandled)
}

/// Both facets referencing columns
pub fn dynamic(content_type: &str, display_name: &str) -> FieldResolution {
    FieldResolution::new(
        FacetResolution::Reference(content_type.into()),
        FacetResolution::Reference(display_name.into()),
    )
}

/// Both facets fixed
pub fn fixed(content_type: &str, display_name: &str) -> FieldResolution {
    FieldResolution::new(
        FacetResolution::Fixed(content_type.into()),
        FacetResolution::Fixed(display_name.into()),
    )
}

/// Names of the named members, in order
pub fn member_names(list: &MemberList) -> Vec<String> {
    list.names().into_iter().map(str::to_string).collect()
}

/// Temporary project directory
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Empty workspace
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Workspace holding `models.py` with [`DOCUMENT_MODEL`]
    pub fn with_document_model() -> Self {
        let workspace = Self::new();
        workspace.write("models.py", DOCUMENT_MODEL);
        workspace
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a relative entry
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Default history file location
    pub fn history_path(&self) -> PathBuf {
        self.path("csfe.yaml")
    }

    /// Write a file, creating parent directories
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    /// Read a file
    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
