//! Names of generated members
//!
//! Literal and accessor shapes of a facet share one name, so adapter bodies
//! reference `self.{field}_{facet}` whatever the facet's kind.

use crate::adapter::AdapterFlavor;
use crate::resolution::Facet;

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Name of the literal attribute or accessor pair exposing a facet
#[inline]
#[must_use]
pub fn facet_member(field: &str, facet: Facet) -> String {
    format!("{field}_{}", facet.key())
}

/// Default name of a column created to hold a dynamic facet
#[inline]
#[must_use]
pub fn default_column(field: &str, facet: Facet) -> String {
    format!("{field}_{}_col", facet.key())
}

/// Name of an adapter accessor pair
#[inline]
#[must_use]
pub fn adapter_member(field: &str, flavor: AdapterFlavor) -> String {
    format!("{field}_{}", flavor.suffix())
}

/// Whether `name` can be used as a Python attribute name
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && !KEYWORDS.contains(&name)
}
