//! Transport-adapter editors
//!
//! An [`AdapterEditor`] owns the download/upload accessor pair of one flavor
//! for one field. Bodies are regenerated from the field's resolution, so a
//! facet changing kind is picked up by the next build.

use csfe_model::{naming, AdapterFlavor, FieldResolution};
use csfe_source::MemberList;

use crate::error::EditError;
use crate::layout::{self, Rank};
use crate::template;

/// Editor for one adapter pair of one field
#[derive(Debug, Clone, Copy)]
pub struct AdapterEditor<'a> {
    flavor: AdapterFlavor,
    field: &'a str,
    resolution: &'a FieldResolution,
    purge_on_unhandled: bool,
}

impl<'a> AdapterEditor<'a> {
    /// Create editor
    #[inline]
    #[must_use]
    pub fn new(
        flavor: AdapterFlavor,
        field: &'a str,
        resolution: &'a FieldResolution,
        purge_on_unhandled: bool,
    ) -> Self {
        Self {
            flavor,
            field,
            resolution,
            purge_on_unhandled,
        }
    }

    /// Name of the accessor pair
    #[inline]
    #[must_use]
    pub fn member_name(&self) -> String {
        naming::adapter_member(self.field, self.flavor)
    }

    /// Whether any half of the pair is declared
    #[must_use]
    pub fn exists(&self, list: &MemberList) -> bool {
        let name = self.member_name();
        list.getter(&name).is_some() || list.setter(&name).is_some()
    }

    /// Generate or patch the pair; fully unhandled fields get none
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NameTaken`] when a plain attribute already uses
    /// the pair's name.
    pub fn build(&self, list: &mut MemberList) -> Result<bool, EditError> {
        if self.resolution.is_fully_unhandled() {
            return Ok(false);
        }
        let name = self.member_name();
        if list.attribute(&name).is_some() {
            return Err(EditError::name_taken(name));
        }
        let getter = template::adapter_getter(self.field, self.resolution, self.flavor);
        let setter = template::adapter_setter(self.field, self.resolution, self.flavor);
        let rank = Rank::adapter(self.flavor);
        let field = self.field;
        let changed = layout::sync_pair(list, &name, getter, setter, |list| {
            layout::anchor_for(list, field, rank)
        });
        if changed {
            tracing::debug!(adapter = %name, flavor = %self.flavor, "built adapter");
        }
        Ok(changed)
    }

    /// Move the pair to `new_field`/`new_resolution`
    ///
    /// A pair that drifted away from its field's group is moved back.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NameTaken`] when the new name is already declared.
    pub fn change(
        &self,
        list: &mut MemberList,
        new_field: &'a str,
        new_resolution: &'a FieldResolution,
    ) -> Result<bool, EditError> {
        let target = Self {
            field: new_field,
            resolution: new_resolution,
            ..*self
        };
        match (
            self.resolution.is_fully_unhandled(),
            new_resolution.is_fully_unhandled(),
        ) {
            (true, true) => Ok(false),
            (true, false) => target.build(list),
            (false, true) => Ok(self.purge_on_unhandled && self.purge(list) > 0),
            (false, false) => {
                let old_name = self.member_name();
                let new_name = target.member_name();
                let mut changed = false;
                if old_name != new_name {
                    if target.exists(list) || list.attribute(&new_name).is_some() {
                        return Err(EditError::name_taken(new_name));
                    }
                    for id in [list.getter(&old_name), list.setter(&old_name)]
                        .into_iter()
                        .flatten()
                    {
                        changed |= list.modify(id, |member| member.rename(&new_name));
                    }
                }
                changed |= target.build(list)?;
                changed |= layout::settle_pair(list, new_field, Rank::adapter(self.flavor));
                Ok(changed)
            }
        }
    }

    /// Remove the pair; returns how many members went away
    pub fn purge(&self, list: &mut MemberList) -> usize {
        let name = self.member_name();
        let removed = layout::remove_named(list, &name, false);
        if removed > 0 {
            tracing::debug!(adapter = %name, removed, "purged adapter");
        }
        removed
    }
}
