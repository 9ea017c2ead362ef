//! Column discovery
//!
//! Classifies the attributes of a declarative model class. An attribute is a
//! column when it is annotated with `Mapped[...]` or assigned from a
//! `Column(...)` / `mapped_column(...)` call. Its storage kind is read from
//! the identifiers of the value and annotation.

use crate::list::MemberList;
use crate::member::Attribute;

const BINARY_TYPES: &[&str] = &["largebinary", "binary", "blob", "varbinary", "bytes"];
const STRING_TYPES: &[&str] = &[
    "string",
    "text",
    "nchar",
    "nvarchar",
    "varchar",
    "unicode",
    "unicodetext",
    "str",
];
const COLUMN_CALLS: &[&str] = &["Column", "mapped_column"];

/// Storage kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Holds raw bytes
    Binary,
    /// Holds text
    String,
    /// Anything else
    Other,
}

/// Column declared on a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Attribute name
    pub name: String,
    /// Storage kind
    pub kind: ColumnKind,
}

fn identifiers(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
}

fn kind_of(text: &str) -> Option<ColumnKind> {
    let tokens: Vec<String> = identifiers(text).map(str::to_ascii_lowercase).collect();
    let has = |set: &[&str]| tokens.iter().any(|t| set.contains(&t.as_str()));
    if has(BINARY_TYPES) {
        Some(ColumnKind::Binary)
    } else if has(STRING_TYPES) {
        Some(ColumnKind::String)
    } else {
        None
    }
}

/// Classify one attribute; `None` when it is not a column
#[must_use]
pub fn classify(attr: &Attribute) -> Option<ColumnKind> {
    let annotation = attr.annotation.as_deref().unwrap_or("");
    if identifiers(annotation).any(|t| t == "ClassVar") {
        return None;
    }
    let mapped = identifiers(annotation).any(|t| t == "Mapped");
    let called = attr
        .value
        .as_ref()
        .and_then(|value| value.callee())
        .is_some_and(|callee| COLUMN_CALLS.contains(&callee));
    if !mapped && !called {
        return None;
    }

    let value = attr.value.as_ref().map(ToString::to_string).unwrap_or_default();
    let kind = kind_of(&value)
        .or_else(|| kind_of(annotation))
        .unwrap_or(ColumnKind::Other);
    Some(kind)
}

/// Columns of a class in declared order
#[must_use]
pub fn columns(members: &MemberList) -> Vec<Column> {
    members
        .iter()
        .filter_map(|(_, member)| member.as_attribute())
        .filter_map(|attr| {
            classify(attr).map(|kind| Column {
                name: attr.name.clone(),
                kind,
            })
        })
        .collect()
}

fn named(members: &MemberList, kind: ColumnKind) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for column in columns(members) {
        if column.kind == kind && !names.contains(&column.name) {
            names.push(column.name);
        }
    }
    names
}

/// Names of binary columns, the fields whose facets are reconciled
#[must_use]
pub fn binary_fields(members: &MemberList) -> Vec<String> {
    named(members, ColumnKind::Binary)
}

/// Names of string columns, candidates for facet references
#[must_use]
pub fn string_columns(members: &MemberList) -> Vec<String> {
    named(members, ColumnKind::String)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_classes;

    const MODEL: &str = "\
class Upload(Base):
    id: Mapped[int] = mapped_column(primary_key=True)
    payload: Mapped[bytes] = mapped_column(LargeBinary)
    legacy = Column(BLOB)
    mime: Mapped[str] = mapped_column(String(64))
    title = sa.Column(sa.UnicodeText, nullable=False)
    note: Mapped[Optional[str]]
    payload_content_type: ClassVar[str] = 'text/plain'
    cache = {}
";

    fn upload() -> MemberList {
        parse_classes(MODEL, "m.py").unwrap().remove(0).members
    }

    #[test]
    fn binary_and_string_columns() {
        let members = upload();
        assert_eq!(binary_fields(&members), vec!["payload", "legacy"]);
        assert_eq!(string_columns(&members), vec!["mime", "title", "note"]);
    }

    #[test]
    fn non_columns_skipped() {
        let names: Vec<_> = columns(&upload()).into_iter().map(|c| c.name).collect();
        assert!(!names.contains(&"payload_content_type".to_string()));
        assert!(!names.contains(&"cache".to_string()));
        assert!(names.contains(&"id".to_string()));
    }

    #[test]
    fn whole_identifier_match() {
        assert_eq!(kind_of("Mapped[Stringly]"), None);
        assert_eq!(kind_of("mapped_column(VARCHAR(10))"), Some(ColumnKind::String));
    }
}
