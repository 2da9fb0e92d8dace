//! Binding groups: which call legs a leg exchanges audio with.

use std::collections::BTreeSet;

use super::CallId;

/// The set of call legs bound to one leg.
///
/// For a leg `A`, `A`'s set lists every ID whose buffer `A` reads from
/// (and, for full-duplex bindings, which reads from `A`'s buffer). Members
/// are kept ordered so conference mixing and diagnostics are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallIdSet {
    members: BTreeSet<CallId>,
}

impl CallIdSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member. Returns `false` if it was already present.
    pub fn insert(&mut self, call_id: impl Into<CallId>) -> bool {
        self.members.insert(call_id.into())
    }

    /// Removes a member. Returns `false` if it was absent.
    pub fn remove(&mut self, call_id: &str) -> bool {
        self.members.remove(call_id)
    }

    /// Returns `true` if `call_id` is a member.
    pub fn contains(&self, call_id: &str) -> bool {
        self.members.contains(call_id)
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates over the members in order.
    pub fn iter(&self) -> impl Iterator<Item = &CallId> {
        self.members.iter()
    }

    /// Returns the only member, if the set has exactly one.
    pub fn single(&self) -> Option<&CallId> {
        if self.members.len() == 1 {
            self.members.first()
        } else {
            None
        }
    }
}

impl<'a> IntoIterator for &'a CallIdSet {
    type Item = &'a CallId;
    type IntoIter = std::collections::btree_set::Iter<'a, CallId>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl<T: Into<CallId>> FromIterator<T> for CallIdSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().map(Into::into).collect(),
        }
    }
}
