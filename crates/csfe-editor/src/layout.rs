//! Placement of generated members
//!
//! Members generated for one field form a group ordered by [`Rank`]: the
//! field attribute, content-type members, display-name members, the
//! synchronous adapter pair, then the asynchronous adapter pair. A new member
//! goes right after the last present member of lower rank; a group whose
//! field attribute is gone grows at the end of the class.

use csfe_model::{naming, AdapterFlavor, Facet};
use csfe_source::{Member, MemberId, MemberList, OrderKey};

/// Position of a member kind inside a field's group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Field,
    ContentType,
    DisplayName,
    SyncAdapter,
    AsyncAdapter,
}

impl Rank {
    const ALL: [Rank; 5] = [
        Rank::Field,
        Rank::ContentType,
        Rank::DisplayName,
        Rank::SyncAdapter,
        Rank::AsyncAdapter,
    ];

    /// Rank of a facet's members
    #[inline]
    #[must_use]
    pub fn facet(facet: Facet) -> Self {
        match facet {
            Facet::ContentType => Rank::ContentType,
            Facet::DisplayName => Rank::DisplayName,
        }
    }

    /// Rank of an adapter pair
    #[inline]
    #[must_use]
    pub fn adapter(flavor: AdapterFlavor) -> Self {
        match flavor {
            AdapterFlavor::Synchronous => Rank::SyncAdapter,
            AdapterFlavor::Asynchronous => Rank::AsyncAdapter,
        }
    }

    fn member_name(self, field: &str) -> String {
        match self {
            Rank::Field => field.to_string(),
            Rank::ContentType => naming::facet_member(field, Facet::ContentType),
            Rank::DisplayName => naming::facet_member(field, Facet::DisplayName),
            Rank::SyncAdapter => naming::adapter_member(field, AdapterFlavor::Synchronous),
            Rank::AsyncAdapter => naming::adapter_member(field, AdapterFlavor::Asynchronous),
        }
    }
}

/// Where to put a new member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    After(MemberId),
    Before(MemberId),
    End,
}

/// Present members of a field's group with their rank and order key
fn group(list: &MemberList, field: &str) -> Vec<(Rank, OrderKey, MemberId)> {
    let mut members = Vec::new();
    for rank in Rank::ALL {
        let name = rank.member_name(field);
        let ids = if rank == Rank::Field {
            vec![list.attribute(&name)]
        } else {
            vec![list.attribute(&name), list.getter(&name), list.setter(&name)]
        };
        for id in ids.into_iter().flatten() {
            if let Some(key) = list.order_key(id) {
                members.push((rank, key, id));
            }
        }
    }
    members
}

/// Anchor for a member of `rank`
pub(crate) fn anchor_for(list: &MemberList, field: &str, rank: Rank) -> Anchor {
    group(list, field)
        .into_iter()
        .filter(|(r, _, _)| *r < rank)
        .max_by_key(|(_, key, _)| *key)
        .map_or(Anchor::End, |(_, _, id)| Anchor::After(id))
}

/// Anchor for a materialised reference column: before the first generated
/// member, else after the field attribute
pub(crate) fn column_anchor(list: &MemberList, field: &str) -> Anchor {
    let members = group(list, field);
    if let Some((_, _, id)) = members
        .iter()
        .filter(|(r, _, _)| *r > Rank::Field)
        .min_by_key(|(_, key, _)| *key)
    {
        return Anchor::Before(*id);
    }
    list.attribute(field).map_or(Anchor::End, Anchor::After)
}

pub(crate) fn insert(list: &mut MemberList, anchor: Anchor, member: Member) -> MemberId {
    match anchor {
        Anchor::After(id) => list.insert_after(id, member),
        Anchor::Before(id) => list.insert_before(id, member),
        Anchor::End => list.push(member),
    }
}

/// Locate a getter/setter pair by name and patch it, creating missing halves.
/// The setter always ends up directly after the getter.
pub(crate) fn sync_pair(
    list: &mut MemberList,
    name: &str,
    getter: Member,
    setter: Member,
    anchor: impl FnOnce(&MemberList) -> Anchor,
) -> bool {
    match (list.getter(name), list.setter(name)) {
        (Some(g), Some(s)) => {
            let patched_getter = list.replace(g, getter);
            let patched_setter = list.replace(s, setter);
            let moved = list.move_after(s, g);
            patched_getter || patched_setter || moved
        }
        (Some(g), None) => {
            list.replace(g, getter);
            list.insert_after(g, setter);
            true
        }
        (None, Some(s)) => {
            list.replace(s, setter);
            list.insert_before(s, getter);
            true
        }
        (None, None) => {
            let at = anchor(list);
            let g = insert(list, at, getter);
            list.insert_after(g, setter);
            true
        }
    }
}

/// Move a pair back next to its group when it drifted; returns whether it moved
pub(crate) fn settle_pair(list: &mut MemberList, field: &str, rank: Rank) -> bool {
    let name = rank.member_name(field);
    let Some(g) = list.getter(&name) else {
        return false;
    };
    let moved = match anchor_for(list, field, rank) {
        Anchor::After(anchor) => list.move_after(g, anchor),
        Anchor::Before(_) | Anchor::End => false,
    };
    let tucked = list.setter(&name).is_some_and(|s| list.move_after(s, g));
    moved || tucked
}

/// Remove every member with `name` in the given slots; returns how many
pub(crate) fn remove_named(list: &mut MemberList, name: &str, attribute: bool) -> usize {
    let mut ids = vec![list.getter(name), list.setter(name)];
    if attribute {
        ids.push(list.attribute(name));
    }
    ids.into_iter()
        .flatten()
        .filter_map(|id| list.remove(id))
        .count()
}
