//! Class members
//!
//! A class body is a sequence of [`Member`]s. Attributes and `@property`
//! accessors are understood structurally; every other statement is kept as
//! [`Member::Opaque`] text.

use std::fmt::Write as _;

use crate::expr::{Expr, Statement};

/// Lookup slot of a named member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// Class attribute
    Attribute,
    /// `@property` getter
    Getter,
    /// `@<name>.setter` setter
    Setter,
}

/// Role of an accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorRole {
    Getter,
    Setter,
}

impl AccessorRole {
    /// Lookup slot for this role
    #[inline]
    #[must_use]
    pub fn slot(self) -> Slot {
        match self {
            AccessorRole::Getter => Slot::Getter,
            AccessorRole::Setter => Slot::Setter,
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Type annotation
    pub annotation: Option<String>,
}

impl Param {
    /// Untyped parameter
    #[inline]
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
        }
    }

    /// Typed parameter
    #[inline]
    #[must_use]
    pub fn typed(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: Some(annotation.into()),
        }
    }
}

/// Class attribute `name: annotation = value`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Type annotation
    pub annotation: Option<String>,
    /// Assigned value
    pub value: Option<Expr>,
}

impl Attribute {
    /// Attribute with neither annotation nor value
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            value: None,
        }
    }

    /// Set annotation
    #[inline]
    #[must_use]
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Set value
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: Expr) -> Self {
        self.value = Some(value);
        self
    }
}

/// `@property` getter or matching setter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Accessor {
    /// Getter or setter
    pub role: AccessorRole,
    /// Property name
    pub name: String,
    /// Declared with `async def`
    pub is_async: bool,
    /// Parameters, `self` included
    pub params: Vec<Param>,
    /// Return annotation
    pub returns: Option<String>,
    /// Body statements
    pub body: Vec<Statement>,
}

impl Accessor {
    /// Getter taking only `self`
    #[must_use]
    pub fn getter(name: impl Into<String>, returns: impl Into<String>, body: Vec<Statement>) -> Self {
        Self {
            role: AccessorRole::Getter,
            name: name.into(),
            is_async: false,
            params: vec![Param::plain("self")],
            returns: Some(returns.into()),
            body,
        }
    }

    /// Setter taking `self` and one typed value
    #[must_use]
    pub fn setter(name: impl Into<String>, value: Param, body: Vec<Statement>) -> Self {
        Self {
            role: AccessorRole::Setter,
            name: name.into(),
            is_async: false,
            params: vec![Param::plain("self"), value],
            returns: Some("None".to_string()),
            body,
        }
    }

    /// Mark as coroutine
    #[inline]
    #[must_use]
    pub fn asynchronous(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Rewrite `self.<old>` references in the body
    pub fn rename_self_attr(&mut self, old: &str, new: &str) -> usize {
        self.body
            .iter_mut()
            .map(|stmt| stmt.rename_self_attr(old, new))
            .sum()
    }
}

/// Member of a class body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Member {
    Attribute(Attribute),
    Accessor(Accessor),
    /// Statement that is not edited, kept verbatim
    Opaque(String),
}

impl Member {
    /// Name of an attribute or accessor
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Member::Attribute(attr) => Some(&attr.name),
            Member::Accessor(acc) => Some(&acc.name),
            Member::Opaque(_) => None,
        }
    }

    /// Lookup slot of an attribute or accessor
    #[must_use]
    pub fn slot(&self) -> Option<Slot> {
        match self {
            Member::Attribute(_) => Some(Slot::Attribute),
            Member::Accessor(acc) => Some(acc.role.slot()),
            Member::Opaque(_) => None,
        }
    }

    /// Rename an attribute or accessor; opaque members are left alone
    pub fn rename(&mut self, name: &str) {
        match self {
            Member::Attribute(attr) => attr.name = name.to_string(),
            Member::Accessor(acc) => acc.name = name.to_string(),
            Member::Opaque(_) => {}
        }
    }

    /// Attribute payload
    #[inline]
    #[must_use]
    pub fn as_attribute(&self) -> Option<&Attribute> {
        match self {
            Member::Attribute(attr) => Some(attr),
            _ => None,
        }
    }

    /// Accessor payload
    #[inline]
    #[must_use]
    pub fn as_accessor(&self) -> Option<&Accessor> {
        match self {
            Member::Accessor(acc) => Some(acc),
            _ => None,
        }
    }

    /// Whether this member prints as a function definition
    #[inline]
    #[must_use]
    pub fn is_accessor(&self) -> bool {
        matches!(self, Member::Accessor(_))
    }

    /// Print without leading indentation; continuation lines are indented
    /// relative to `indent`
    #[must_use]
    pub fn render(&self, indent: &str) -> String {
        let mut out = String::new();
        match self {
            Member::Attribute(attr) => {
                out.push_str(&attr.name);
                if let Some(annotation) = &attr.annotation {
                    let _ = write!(out, ": {annotation}");
                }
                if let Some(value) = &attr.value {
                    let _ = write!(out, " = {value}");
                }
            }
            Member::Accessor(acc) => {
                match acc.role {
                    AccessorRole::Getter => out.push_str("@property"),
                    AccessorRole::Setter => {
                        let _ = write!(out, "@{}.setter", acc.name);
                    }
                }
                let _ = write!(out, "\n{indent}");
                if acc.is_async {
                    out.push_str("async ");
                }
                let params = acc
                    .params
                    .iter()
                    .map(|p| match &p.annotation {
                        Some(annotation) => format!("{}: {annotation}", p.name),
                        None => p.name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = write!(out, "def {}({params})", acc.name);
                if let Some(returns) = &acc.returns {
                    let _ = write!(out, " -> {returns}");
                }
                out.push(':');
                if acc.body.is_empty() {
                    let _ = write!(out, "\n{indent}    pass");
                }
                for stmt in &acc.body {
                    let _ = write!(out, "\n{indent}    {stmt}");
                }
            }
            Member::Opaque(text) => out.push_str(text),
        }
        out
    }
}

impl From<Attribute> for Member {
    fn from(attr: Attribute) -> Self {
        Member::Attribute(attr)
    }
}

impl From<Accessor> for Member {
    fn from(acc: Accessor) -> Self {
        Member::Accessor(acc)
    }
}
