//! Facet resolutions
//!
//! A binary field exposes two facets, its content type and its display name.
//! Each facet is resolved to a fixed literal, a reference to another column,
//! or left unhandled. [`FieldResolution`] carries both facets or the
//! fully-unhandled override.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Auxiliary property tracked per binary field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// MIME type of the stored bytes
    ContentType,
    /// File name offered on download
    DisplayName,
}

impl Facet {
    /// Both facets, in resolution order
    pub const ALL: [Facet; 2] = [Facet::ContentType, Facet::DisplayName];

    /// Identifier fragment used in generated names and history keys
    #[inline]
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Facet::ContentType => "content_type",
            Facet::DisplayName => "display_name",
        }
    }

    /// Human-readable label for prompts
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Facet::ContentType => "content type",
            Facet::DisplayName => "display name",
        }
    }

    /// Literal used when a static value is left empty
    #[inline]
    #[must_use]
    pub fn default_literal(&self) -> &'static str {
        match self {
            Facet::ContentType => "application/octet-stream",
            Facet::DisplayName => "binary.file",
        }
    }
}

impl Display for Facet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Shape of a facet resolution, used to drive the transition matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionKind {
    /// Fixed literal
    Static,
    /// Reference to another column
    Dynamic,
    /// No generated members
    Unhandled,
}

impl Display for ResolutionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionKind::Static => "static",
            ResolutionKind::Dynamic => "dynamic",
            ResolutionKind::Unhandled => "unhandled",
        };
        f.write_str(name)
    }
}

/// Resolution of a single facet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FacetResolution {
    /// Explicitly unhandled
    Unhandled,
    /// Fixed literal value
    Fixed(String),
    /// Name of the column holding the value
    Reference(String),
}

/// Shared unhandled value handed out for fully-unhandled fields
static UNHANDLED: FacetResolution = FacetResolution::Unhandled;

impl FacetResolution {
    /// Kind of this resolution
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResolutionKind {
        match self {
            FacetResolution::Unhandled => ResolutionKind::Unhandled,
            FacetResolution::Fixed(_) => ResolutionKind::Static,
            FacetResolution::Reference(_) => ResolutionKind::Dynamic,
        }
    }

    /// Literal value, if fixed
    #[inline]
    #[must_use]
    pub fn fixed_value(&self) -> Option<&str> {
        match self {
            FacetResolution::Fixed(value) => Some(value),
            _ => None,
        }
    }

    /// Referenced column, if dynamic
    #[inline]
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        match self {
            FacetResolution::Reference(column) => Some(column),
            _ => None,
        }
    }

    /// Whether any member is generated for this facet
    #[inline]
    #[must_use]
    pub fn is_handled(&self) -> bool {
        !matches!(self, FacetResolution::Unhandled)
    }
}

impl Display for FacetResolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FacetResolution::Unhandled => f.write_str("unhandled"),
            FacetResolution::Fixed(value) => write!(f, "static <{value}>"),
            FacetResolution::Reference(column) => write!(f, "dynamic <{column}>"),
        }
    }
}

/// Full resolution of a binary field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldResolution {
    /// Neither facet nor adapter is generated
    FullyUnhandled,
    /// Per-facet resolutions
    Facets {
        /// Content type resolution
        content_type: FacetResolution,
        /// Display name resolution
        display_name: FacetResolution,
    },
}

impl FieldResolution {
    /// Build from both facets
    #[inline]
    #[must_use]
    pub fn new(content_type: FacetResolution, display_name: FacetResolution) -> Self {
        Self::Facets {
            content_type,
            display_name,
        }
    }

    /// Resolution of one facet; fully-unhandled fields report `Unhandled`
    #[inline]
    #[must_use]
    pub fn facet(&self, facet: Facet) -> &FacetResolution {
        match (self, facet) {
            (Self::FullyUnhandled, _) => &UNHANDLED,
            (Self::Facets { content_type, .. }, Facet::ContentType) => content_type,
            (Self::Facets { display_name, .. }, Facet::DisplayName) => display_name,
        }
    }

    /// Check the fully-unhandled override
    #[inline]
    #[must_use]
    pub fn is_fully_unhandled(&self) -> bool {
        matches!(self, Self::FullyUnhandled)
    }

    /// Column referenced by one facet
    #[inline]
    #[must_use]
    pub fn reference(&self, facet: Facet) -> Option<&str> {
        self.facet(facet).reference()
    }
}

impl Display for FieldResolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullyUnhandled => f.write_str("fully unhandled"),
            Self::Facets {
                content_type,
                display_name,
            } => write!(f, "content type {content_type}, display name {display_name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facet_defaults() {
        assert_eq!(Facet::ContentType.default_literal(), "application/octet-stream");
        assert_eq!(Facet::DisplayName.default_literal(), "binary.file");
    }

    #[test]
    fn fully_unhandled_reports_unhandled_facets() {
        let resolution = FieldResolution::FullyUnhandled;
        for facet in Facet::ALL {
            assert_eq!(resolution.facet(facet), &FacetResolution::Unhandled);
        }
        assert!(resolution.is_fully_unhandled());
    }

    #[test]
    fn facet_lookup() {
        let resolution = FieldResolution::new(
            FacetResolution::Reference("mime".into()),
            FacetResolution::Fixed("a.bin".into()),
        );
        assert_eq!(resolution.reference(Facet::ContentType), Some("mime"));
        assert_eq!(resolution.reference(Facet::DisplayName), None);
        assert_eq!(
            resolution.facet(Facet::DisplayName).kind(),
            ResolutionKind::Static
        );
    }

    #[test]
    fn display_is_readable() {
        let resolution = FieldResolution::new(
            FacetResolution::Fixed("text/plain".into()),
            FacetResolution::Unhandled,
        );
        assert_eq!(
            resolution.to_string(),
            "content type static <text/plain>, display name unhandled"
        );
    }
}
