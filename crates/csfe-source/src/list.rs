//! Ordered member list
//!
//! Members live in an arena addressed by stable [`MemberId`]s. Declared order
//! is a map of sparse [`OrderKey`]s, so inserting next to a member and moving
//! a member cost `O(log n)`; keys are respaced only when a gap runs out. A
//! `(slot, name)` index gives constant-time lookup; the first occurrence of a
//! name wins. Opaque members are ordered but never indexed.
//!
//! Members parsed from source keep their original text until mutated, so
//! untouched code prints back byte-for-byte.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use crate::member::{Member, Slot};

const SPACING: u64 = 1 << 20;

/// Stable handle to a member of one [`MemberList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(usize);

/// Sort key of a member in declared order
///
/// Keys compare like positions but are only meaningful within one list and
/// until the next mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderKey(u64);

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) member: Member,
    /// Original text of the member, dropped on mutation
    pub(crate) verbatim: Option<String>,
    /// Original text between the previous member and this one
    pub(crate) gap: Option<String>,
    key: u64,
}

type IndexKey = (Slot, String);

/// Ordered members of one class body
#[derive(Debug, Clone, Default)]
pub struct MemberList {
    arena: Vec<Option<Entry>>,
    order: BTreeMap<u64, MemberId>,
    index: HashMap<IndexKey, Vec<MemberId>>,
    indent: String,
}

fn index_key(member: &Member) -> Option<IndexKey> {
    Some((member.slot()?, member.name()?.to_string()))
}

impl MemberList {
    /// Empty list printed with four-space indentation
    #[must_use]
    pub fn new() -> Self {
        Self::with_indent("    ")
    }

    /// Empty list printed with `indent`
    #[must_use]
    pub fn with_indent(indent: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
            ..Self::default()
        }
    }

    /// Build from members
    #[must_use]
    pub fn from_members(members: impl IntoIterator<Item = Member>) -> Self {
        let mut list = Self::new();
        for member in members {
            list.push(member);
        }
        list
    }

    pub(crate) fn push_parsed(&mut self, member: Member, verbatim: String, gap: String) -> MemberId {
        let key = self.key_between(self.last_key(), None);
        self.attach(key, member, Some(verbatim), Some(gap))
    }

    fn attach(&mut self, key: u64, member: Member, verbatim: Option<String>, gap: Option<String>) -> MemberId {
        let id = MemberId(self.arena.len());
        if let Some(slot) = index_key(&member) {
            self.index.entry(slot).or_default().push(id);
        }
        self.arena.push(Some(Entry {
            member,
            verbatim,
            gap,
            key,
        }));
        self.order.insert(key, id);
        id
    }

    fn unindex(&mut self, slot: &IndexKey, id: MemberId) {
        if let Some(ids) = self.index.get_mut(slot) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.index.remove(slot);
            }
        }
    }

    fn last_key(&self) -> Option<u64> {
        self.order.keys().next_back().copied()
    }

    fn key_of(&self, id: MemberId) -> Option<u64> {
        self.entry(id).map(|entry| entry.key)
    }

    fn key_after(&self, key: u64) -> Option<u64> {
        self.order
            .range((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(&k, _)| k)
    }

    fn key_before(&self, key: u64) -> Option<u64> {
        self.order.range(..key).next_back().map(|(&k, _)| k)
    }

    /// Free key strictly between `prev` and `next`; respaces when none is left
    fn key_between(&mut self, prev: Option<u64>, next: Option<u64>) -> u64 {
        let low = prev.map_or(0, |k| k + 1);
        match next {
            None => prev.map_or(SPACING, |k| k + SPACING),
            Some(high) if high > low => low + (high - low) / 2,
            Some(high) => {
                let prev_id = prev.and_then(|k| self.order.get(&k).copied());
                let next_id = self.order.get(&high).copied();
                self.respace();
                let prev = prev_id.and_then(|id| self.key_of(id));
                let next = next_id.and_then(|id| self.key_of(id));
                self.key_between(prev, next)
            }
        }
    }

    fn respace(&mut self) {
        let ids: Vec<MemberId> = self.order.values().copied().collect();
        tracing::trace!(members = ids.len(), "respacing member order");
        self.order.clear();
        for (n, id) in (1u64..).zip(ids) {
            let key = n * SPACING;
            if let Some(entry) = self.arena[id.0].as_mut() {
                entry.key = key;
            }
            self.order.insert(key, id);
        }
    }

    /// Indentation of the class body
    #[inline]
    #[must_use]
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Number of members
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the body has no members
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Locate a member by slot and name
    #[must_use]
    pub fn find(&self, slot: Slot, name: &str) -> Option<MemberId> {
        self.index
            .get(&(slot, name.to_string()))?
            .iter()
            .copied()
            .min_by_key(|&id| self.key_of(id))
    }

    /// Locate an attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<MemberId> {
        self.find(Slot::Attribute, name)
    }

    /// Locate a getter
    #[inline]
    #[must_use]
    pub fn getter(&self, name: &str) -> Option<MemberId> {
        self.find(Slot::Getter, name)
    }

    /// Locate a setter
    #[inline]
    #[must_use]
    pub fn setter(&self, name: &str) -> Option<MemberId> {
        self.find(Slot::Setter, name)
    }

    /// Member behind a handle; `None` once removed
    #[inline]
    #[must_use]
    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.entry(id).map(|entry| &entry.member)
    }

    pub(crate) fn entry(&self, id: MemberId) -> Option<&Entry> {
        self.arena.get(id.0).and_then(Option::as_ref)
    }

    /// Sort key of a member, for comparing positions
    #[inline]
    #[must_use]
    pub fn order_key(&self, id: MemberId) -> Option<OrderKey> {
        self.key_of(id).map(OrderKey)
    }

    /// Position in declared order; counts the members before it
    #[must_use]
    pub fn position(&self, id: MemberId) -> Option<usize> {
        let key = self.key_of(id)?;
        Some(self.order.range(..key).count())
    }

    /// Handle at a position
    #[must_use]
    pub fn id_at(&self, position: usize) -> Option<MemberId> {
        self.order.values().nth(position).copied()
    }

    /// Apply `f` to a member; its original text is dropped only when the
    /// member actually changed. Returns whether it changed.
    pub fn modify(&mut self, id: MemberId, f: impl FnOnce(&mut Member)) -> bool {
        let Some(entry) = self.arena.get_mut(id.0).and_then(Option::as_mut) else {
            return false;
        };
        let mut member = entry.member.clone();
        f(&mut member);
        if member == entry.member {
            return false;
        }
        let before = index_key(&entry.member);
        let after = index_key(&member);
        entry.member = member;
        entry.verbatim = None;
        if before != after {
            if let Some(slot) = before {
                self.unindex(&slot, id);
            }
            if let Some(slot) = after {
                self.index.entry(slot).or_default().push(id);
            }
        }
        true
    }

    /// Replace a member in place, keeping its position
    pub fn replace(&mut self, id: MemberId, member: Member) -> bool {
        self.modify(id, |slot| *slot = member)
    }

    /// Append a member
    pub fn push(&mut self, member: Member) -> MemberId {
        let key = self.key_between(self.last_key(), None);
        self.attach(key, member, None, None)
    }

    /// Insert at a position, clamped to the end
    pub fn insert_at(&mut self, position: usize, member: Member) -> MemberId {
        match self.id_at(position) {
            Some(anchor) => self.insert_before(anchor, member),
            None => self.push(member),
        }
    }

    /// Insert right after `anchor`; appends when the anchor is gone
    pub fn insert_after(&mut self, anchor: MemberId, member: Member) -> MemberId {
        let Some(prev) = self.key_of(anchor) else {
            return self.push(member);
        };
        let next = self.key_after(prev);
        let key = self.key_between(Some(prev), next);
        self.attach(key, member, None, None)
    }

    /// Insert right before `anchor`; appends when the anchor is gone
    pub fn insert_before(&mut self, anchor: MemberId, member: Member) -> MemberId {
        let Some(next) = self.key_of(anchor) else {
            return self.push(member);
        };
        let prev = self.key_before(next);
        let key = self.key_between(prev, Some(next));
        self.attach(key, member, None, None)
    }

    /// Remove a member, returning it
    pub fn remove(&mut self, id: MemberId) -> Option<Member> {
        let entry = self.arena.get_mut(id.0).and_then(Option::take)?;
        self.order.remove(&entry.key);
        if let Some(slot) = index_key(&entry.member) {
            self.unindex(&slot, id);
        }
        Some(entry.member)
    }

    /// Give `id` a new key; its original leading gap no longer applies
    fn rekey(&mut self, id: MemberId, key: u64) {
        if let Some(entry) = self.arena[id.0].as_mut() {
            self.order.remove(&entry.key);
            entry.key = key;
            entry.gap = None;
        }
        self.order.insert(key, id);
    }

    /// Move a member to `position` (counted after its removal)
    pub fn relocate(&mut self, id: MemberId, position: usize) -> bool {
        let Some(current) = self.position(id) else {
            return false;
        };
        let position = position.min(self.len() - 1);
        if current == position {
            return false;
        }
        let target = if position < current {
            self.id_at(position)
        } else {
            self.id_at(position + 1)
        };
        let key = match target.and_then(|t| self.key_of(t)) {
            Some(next) => {
                let prev = self.key_before(next);
                self.key_between(prev, Some(next))
            }
            None => self.key_between(self.last_key(), None),
        };
        self.rekey(id, key);
        true
    }

    /// Move `id` so it directly follows `anchor`; returns whether it moved
    pub fn move_after(&mut self, id: MemberId, anchor: MemberId) -> bool {
        if id == anchor {
            return false;
        }
        let (Some(current), Some(prev)) = (self.key_of(id), self.key_of(anchor)) else {
            return false;
        };
        let next = self.key_after(prev);
        if next == Some(current) {
            return false;
        }
        let key = self.key_between(Some(prev), next);
        self.rekey(id, key);
        true
    }

    /// Members in declared order
    pub fn iter(&self) -> impl Iterator<Item = (MemberId, &Member)> + '_ {
        self.order
            .values()
            .filter_map(|&id| self.get(id).map(|member| (id, member)))
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.order.values().filter_map(|&id| self.entry(id))
    }

    /// Handles in declared order
    #[must_use]
    pub fn ids(&self) -> Vec<MemberId> {
        self.order.values().copied().collect()
    }

    /// Owned copy of the members in declared order
    #[must_use]
    pub fn snapshot(&self) -> Vec<Member> {
        self.iter().map(|(_, member)| member.clone()).collect()
    }

    /// Names of named members in order, for diagnostics
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.iter().filter_map(|(_, member)| member.name()).collect()
    }
}

impl PartialEq for MemberList {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl Eq for MemberList {}
