//! Whole-field editing
//!
//! [`FieldEditor`] drives both facet editors and both adapter editors for one
//! field under a [`PurgePolicy`] and the enabled adapter flavor.

use csfe_model::{AdapterFlavor, Facet, FieldResolution};
use csfe_source::MemberList;

use crate::adapter::AdapterEditor;
use crate::error::EditError;
use crate::facet::FacetEditor;

/// Whether members are purged when their resolution becomes unhandled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgePolicy {
    /// Purge content-type members
    pub content_type: bool,
    /// Purge display-name members
    pub display_name: bool,
    /// Purge the synchronous adapter pair
    pub sync_adapter: bool,
    /// Purge the asynchronous adapter pair
    pub async_adapter: bool,
}

impl Default for PurgePolicy {
    fn default() -> Self {
        Self::uniform(true)
    }
}

impl PurgePolicy {
    /// Same flag everywhere
    #[inline]
    #[must_use]
    pub fn uniform(purge: bool) -> Self {
        Self {
            content_type: purge,
            display_name: purge,
            sync_adapter: purge,
            async_adapter: purge,
        }
    }

    /// Flag for a facet
    #[inline]
    #[must_use]
    pub fn facet(&self, facet: Facet) -> bool {
        match facet {
            Facet::ContentType => self.content_type,
            Facet::DisplayName => self.display_name,
        }
    }

    /// Flag for an adapter flavor
    #[inline]
    #[must_use]
    pub fn adapter(&self, flavor: AdapterFlavor) -> bool {
        match flavor {
            AdapterFlavor::Synchronous => self.sync_adapter,
            AdapterFlavor::Asynchronous => self.async_adapter,
        }
    }
}

/// Editor for every generated member of one field
#[derive(Debug, Clone, Copy)]
pub struct FieldEditor<'a> {
    field: &'a str,
    resolution: &'a FieldResolution,
    policy: PurgePolicy,
    enabled: AdapterFlavor,
}

impl<'a> FieldEditor<'a> {
    /// Create editor
    #[inline]
    #[must_use]
    pub fn new(
        field: &'a str,
        resolution: &'a FieldResolution,
        policy: PurgePolicy,
        enabled: AdapterFlavor,
    ) -> Self {
        Self {
            field,
            resolution,
            policy,
            enabled,
        }
    }

    fn facet(&self, facet: Facet) -> FacetEditor<'a> {
        FacetEditor::new(
            facet,
            self.field,
            self.resolution.facet(facet),
            self.policy.facet(facet),
        )
    }

    fn adapter(&self, flavor: AdapterFlavor) -> AdapterEditor<'a> {
        AdapterEditor::new(flavor, self.field, self.resolution, self.policy.adapter(flavor))
    }

    /// Build both facets and the enabled adapter; purge the disabled adapter
    /// when its flag is set
    ///
    /// # Errors
    ///
    /// Returns the first editor precondition failure.
    pub fn build(&self, list: &mut MemberList) -> Result<bool, EditError> {
        let mut changed = false;
        for facet in Facet::ALL {
            changed |= self.facet(facet).build(list)?;
        }
        changed |= self.adapter(self.enabled).build(list)?;
        let disabled = self.enabled.other();
        if self.policy.adapter(disabled) {
            changed |= self.adapter(disabled).purge(list) > 0;
        }
        Ok(changed)
    }

    /// Move every member to `new_field` / `new_resolution`
    ///
    /// The disabled adapter is only carried along when it is declared.
    ///
    /// # Errors
    ///
    /// Returns the first editor precondition failure.
    pub fn change(
        &self,
        list: &mut MemberList,
        new_field: &'a str,
        new_resolution: &'a FieldResolution,
    ) -> Result<bool, EditError> {
        let mut changed = false;
        for facet in Facet::ALL {
            changed |= self
                .facet(facet)
                .change(list, new_field, new_resolution.facet(facet))?;
        }
        changed |= self
            .adapter(self.enabled)
            .change(list, new_field, new_resolution)?;
        let disabled = self.adapter(self.enabled.other());
        if disabled.exists(list) {
            changed |= disabled.change(list, new_field, new_resolution)?;
        }
        Ok(changed)
    }

    /// Remove every generated member except reference columns
    pub fn purge(&self, list: &mut MemberList) -> usize {
        let mut removed = 0;
        for facet in Facet::ALL {
            removed += self.facet(facet).purge(list);
        }
        for flavor in AdapterFlavor::ALL {
            removed += self.adapter(flavor).purge(list);
        }
        removed
    }
}
