//! Error types for member editing

/// Edit refused because the class does not meet a precondition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// A generated member would land on a name that is already declared
    #[error("cannot generate '{name}': name is already declared")]
    NameTaken { name: String },

    /// A facet reference points at a name the field itself generates
    #[error("'{member}' cannot reference '{reference}'")]
    InvalidReference { member: String, reference: String },
}

impl EditError {
    /// Create name-taken error
    #[inline]
    #[must_use]
    pub fn name_taken(name: impl Into<String>) -> Self {
        Self::NameTaken { name: name.into() }
    }

    /// Create invalid-reference error
    #[inline]
    #[must_use]
    pub fn invalid_reference(member: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::InvalidReference {
            member: member.into(),
            reference: reference.into(),
        }
    }
}
