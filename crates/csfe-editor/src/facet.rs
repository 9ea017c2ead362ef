//! Facet editors
//!
//! One [`FacetEditor`] owns the members exposing a single facet of a single
//! field: a `ClassVar` literal for a fixed value, or a getter/setter pair over
//! a reference column. Members are located by name, so every operation is
//! idempotent.
//!
//! # Transitions
//!
//! [`FacetEditor::change`] dispatches on `(old kind, new kind)`:
//!
//! | old \ new  | static                | dynamic               | unhandled              |
//! |------------|-----------------------|-----------------------|------------------------|
//! | static     | retarget literal      | literal → pair        | purge literal if set   |
//! | dynamic    | pair → literal        | retarget reference    | purge pair if set      |
//! | unhandled  | build literal         | build pair            | nothing                |

use csfe_model::{naming, Facet, FacetResolution, ResolutionKind};
use csfe_source::columns::classify;
use csfe_source::{Member, MemberList};

use crate::error::EditError;
use crate::layout::{self, Rank};
use crate::template;

fn is_column(list: &MemberList, name: &str) -> bool {
    list.attribute(name)
        .and_then(|id| list.get(id))
        .and_then(Member::as_attribute)
        .is_some_and(|attr| classify(attr).is_some())
}

/// Editor for the members of one facet of one field
#[derive(Debug, Clone, Copy)]
pub struct FacetEditor<'a> {
    facet: Facet,
    field: &'a str,
    resolution: &'a FacetResolution,
    purge_on_unhandled: bool,
}

impl<'a> FacetEditor<'a> {
    /// Create editor
    #[inline]
    #[must_use]
    pub fn new(
        facet: Facet,
        field: &'a str,
        resolution: &'a FacetResolution,
        purge_on_unhandled: bool,
    ) -> Self {
        Self {
            facet,
            field,
            resolution,
            purge_on_unhandled,
        }
    }

    /// Name shared by the literal and the accessor pair
    #[inline]
    #[must_use]
    pub fn member_name(&self) -> String {
        naming::facet_member(self.field, self.facet)
    }

    fn retarget(&self, field: &'a str, resolution: &'a FacetResolution) -> Self {
        Self {
            field,
            resolution,
            ..*self
        }
    }

    fn check_reference(&self, column: &str) -> Result<(), EditError> {
        let name = self.member_name();
        let generated = [
            name.clone(),
            naming::adapter_member(self.field, csfe_model::AdapterFlavor::Synchronous),
            naming::adapter_member(self.field, csfe_model::AdapterFlavor::Asynchronous),
        ];
        if column == self.field || generated.iter().any(|g| g == column) {
            return Err(EditError::invalid_reference(name, column));
        }
        Ok(())
    }

    /// Generate or patch the members for the current resolution
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidReference`] when a reference points at the
    /// field or at one of its generated members, and [`EditError::NameTaken`]
    /// when a column already uses the facet's name.
    pub fn build(&self, list: &mut MemberList) -> Result<bool, EditError> {
        let name = self.member_name();
        if self.resolution.is_handled() && is_column(list, &name) {
            return Err(EditError::name_taken(name));
        }
        match self.resolution {
            FacetResolution::Unhandled => Ok(false),
            FacetResolution::Fixed(value) => Ok(self.build_literal(list, &name, value)),
            FacetResolution::Reference(column) => {
                self.check_reference(column)?;
                let mut changed = self.build_pair(list, &name, column);
                if list.attribute(column).is_none() {
                    let at = layout::column_anchor(list, self.field);
                    layout::insert(list, at, template::reference_column(column));
                    tracing::debug!(column = %column, field = self.field, "materialised reference column");
                    changed = true;
                }
                Ok(changed)
            }
        }
    }

    fn build_literal(&self, list: &mut MemberList, name: &str, value: &str) -> bool {
        let literal = template::facet_literal(name, value);
        if let Some(id) = list.attribute(name) {
            return list.replace(id, literal);
        }
        match (list.getter(name), list.setter(name)) {
            (Some(g), setter) => {
                list.replace(g, literal);
                if let Some(s) = setter {
                    list.remove(s);
                }
            }
            (None, Some(s)) => {
                list.replace(s, literal);
            }
            (None, None) => {
                let at = layout::anchor_for(list, self.field, Rank::facet(self.facet));
                layout::insert(list, at, literal);
            }
        }
        true
    }

    fn build_pair(&self, list: &mut MemberList, name: &str, column: &str) -> bool {
        let getter = template::facet_getter(name, column);
        let setter = template::facet_setter(name, column);
        if let Some(literal) = list.attribute(name).filter(|_| list.getter(name).is_none()) {
            list.replace(literal, getter);
            list.insert_after(literal, setter);
            return true;
        }
        let rank = Rank::facet(self.facet);
        let field = self.field;
        layout::sync_pair(list, name, getter, setter, |list| {
            layout::anchor_for(list, field, rank)
        })
    }

    /// Move the members from this field/resolution to `new_field`/`new_resolution`
    ///
    /// Unchanged values keep member identity and only rename; conversions
    /// take the position of the member they replace.
    ///
    /// # Errors
    ///
    /// Returns an error when the new name is already declared by another
    /// member or the new reference is invalid.
    pub fn change(
        &self,
        list: &mut MemberList,
        new_field: &'a str,
        new_resolution: &'a FacetResolution,
    ) -> Result<bool, EditError> {
        let target = self.retarget(new_field, new_resolution);
        let old_name = self.member_name();
        let new_name = target.member_name();

        let old_kind = self.resolution.kind();
        let new_kind = new_resolution.kind();
        if old_name != new_name
            && old_kind != ResolutionKind::Unhandled
            && new_kind != ResolutionKind::Unhandled
            && [list.attribute(&new_name), list.getter(&new_name), list.setter(&new_name)]
                .iter()
                .any(Option::is_some)
        {
            return Err(EditError::name_taken(new_name));
        }
        if let FacetResolution::Reference(column) = new_resolution {
            target.check_reference(column)?;
        }

        tracing::debug!(
            facet = %self.facet,
            from = %old_name,
            to = %new_name,
            transition = %format!("{old_kind} -> {new_kind}"),
            "changing facet"
        );

        let changed = match (old_kind, new_kind) {
            (ResolutionKind::Static, ResolutionKind::Static) => {
                let renamed = list
                    .attribute(&old_name)
                    .is_some_and(|id| list.modify(id, |m| m.rename(&new_name)));
                target.build(list)? || renamed
            }
            (ResolutionKind::Static, ResolutionKind::Dynamic) => {
                if let (Some(id), Some(column)) = (list.attribute(&old_name), new_resolution.reference()) {
                    list.replace(id, template::facet_getter(&new_name, column));
                    list.insert_after(id, template::facet_setter(&new_name, column));
                }
                target.build(list)?;
                true
            }
            (ResolutionKind::Dynamic, ResolutionKind::Static) => {
                if let Some(value) = new_resolution.fixed_value() {
                    let literal = template::facet_literal(&new_name, value);
                    match (list.getter(&old_name), list.setter(&old_name)) {
                        (Some(g), setter) => {
                            list.replace(g, literal);
                            if let Some(s) = setter {
                                list.remove(s);
                            }
                        }
                        (None, Some(s)) => {
                            list.replace(s, literal);
                        }
                        (None, None) => {}
                    }
                }
                target.build(list)?;
                true
            }
            (ResolutionKind::Dynamic, ResolutionKind::Dynamic) => {
                let old_ref = self.resolution.reference().unwrap_or_default();
                let new_ref = new_resolution.reference().unwrap_or_default();
                let mut renamed = false;
                for id in [list.getter(&old_name), list.setter(&old_name)].into_iter().flatten() {
                    renamed |= list.modify(id, |member| {
                        member.rename(&new_name);
                        if let Member::Accessor(acc) = member {
                            acc.rename_self_attr(old_ref, new_ref);
                        }
                    });
                }
                target.build(list)? || renamed
            }
            (ResolutionKind::Static | ResolutionKind::Dynamic, ResolutionKind::Unhandled) => {
                self.purge_on_unhandled && self.purge(list) > 0
            }
            (ResolutionKind::Unhandled, ResolutionKind::Static | ResolutionKind::Dynamic) => {
                target.build(list)?
            }
            (ResolutionKind::Unhandled, ResolutionKind::Unhandled) => false,
        };
        Ok(changed)
    }

    /// Remove the literal and accessors of this facet; columns are kept
    pub fn purge(&self, list: &mut MemberList) -> usize {
        let name = self.member_name();
        let literal = list.attribute(&name).filter(|_| !is_column(list, &name));
        let removed = layout::remove_named(list, &name, false)
            + literal.and_then(|id| list.remove(id)).map_or(0, |_| 1);
        if removed > 0 {
            tracing::debug!(member = %name, removed, "purged facet");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csfe_source::{render_indented, Attribute, Expr};
    use pretty_assertions::assert_eq;

    fn model() -> MemberList {
        MemberList::from_members([
            Attribute::new("id").with_annotation("Mapped[int]").into(),
            Attribute::new("file")
                .with_annotation("Mapped[bytes]")
                .with_value(Expr::name("mapped_column").call(vec![Expr::name("LargeBinary")], vec![]))
                .into(),
        ])
    }

    fn fixed(v: &str) -> FacetResolution {
        FacetResolution::Fixed(v.into())
    }

    fn reference(c: &str) -> FacetResolution {
        FacetResolution::Reference(c.into())
    }

    #[test]
    fn build_static_then_idempotent() {
        let mut list = model();
        let res = fixed("application/octet-stream");
        let editor = FacetEditor::new(Facet::ContentType, "file", &res, true);
        assert!(editor.build(&mut list).unwrap());
        let once = list.clone();
        assert!(!editor.build(&mut list).unwrap());
        assert_eq!(list, once);
        assert_eq!(
            list.names(),
            vec!["id", "file", "file_content_type"]
        );
    }

    #[test]
    fn build_dynamic_creates_column_before_pair() {
        let mut list = model();
        let res = reference("file_content_type_col");
        FacetEditor::new(Facet::ContentType, "file", &res, true)
            .build(&mut list)
            .unwrap();
        assert_eq!(
            render_indented(&list),
            "    id: Mapped[int]
    file: Mapped[bytes] = mapped_column(LargeBinary)
    file_content_type_col: Mapped[str | None] = mapped_column(String, nullable=True)

    @property
    def file_content_type(self) -> str | None:
        return self.file_content_type_col

    @file_content_type.setter
    def file_content_type(self, value: str | None) -> None:
        self.file_content_type_col = value
"
        );
    }

    #[test]
    fn build_unhandled_is_noop() {
        let mut list = model();
        let res = FacetResolution::Unhandled;
        assert!(!FacetEditor::new(Facet::DisplayName, "file", &res, true)
            .build(&mut list)
            .unwrap());
        assert_eq!(list, model());
    }

    #[test]
    fn self_reference_rejected() {
        let mut list = model();
        let res = reference("file_content_type");
        let err = FacetEditor::new(Facet::ContentType, "file", &res, true)
            .build(&mut list)
            .unwrap_err();
        assert!(matches!(err, EditError::InvalidReference { .. }));
    }

    #[test]
    fn change_same_value_is_pure_rename() {
        let mut list = model();
        let res = fixed("application/octet-stream");
        let editor = FacetEditor::new(Facet::ContentType, "file", &res, true);
        editor.build(&mut list).unwrap();
        let id = list.attribute("file_content_type").unwrap();

        editor.change(&mut list, "blob", &res).unwrap();
        assert_eq!(list.attribute("blob_content_type"), Some(id));
        assert!(list.attribute("file_content_type").is_none());
    }

    #[test]
    fn change_twice_is_stable() {
        let mut list = model();
        let res = fixed("application/octet-stream");
        let editor = FacetEditor::new(Facet::ContentType, "file", &res, true);
        editor.build(&mut list).unwrap();
        editor.change(&mut list, "file", &res).unwrap();
        let once = list.clone();
        assert!(!editor.change(&mut list, "file", &res).unwrap());
        assert_eq!(list, once);
    }

    #[test]
    fn column_named_like_facet_is_refused() {
        let mut list = model();
        list.push(
            Attribute::new("file_content_type")
                .with_annotation("Mapped[str]")
                .into(),
        );
        let res = fixed("text/plain");
        let editor = FacetEditor::new(Facet::ContentType, "file", &res, true);
        assert_eq!(
            editor.build(&mut list),
            Err(EditError::name_taken("file_content_type"))
        );
        assert_eq!(editor.purge(&mut list), 0);
    }

    #[test]
    fn purge_keeps_columns() {
        let mut list = model();
        let res = reference("file_content_type_col");
        let editor = FacetEditor::new(Facet::ContentType, "file", &res, true);
        editor.build(&mut list).unwrap();
        assert_eq!(editor.purge(&mut list), 2);
        assert_eq!(list.names(), vec!["id", "file", "file_content_type_col"]);
        assert_eq!(editor.purge(&mut list), 0);
    }
}
