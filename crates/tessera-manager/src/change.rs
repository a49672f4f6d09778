//! Change accumulation and the coalesced change message.
//!
//! A [`ChangeLog`] records the net effect of one mutation scope on each
//! identifier. When the outermost scope closes it is converted into an
//! immutable [`ChangeMessage`] and delivered once.

use std::collections::{BTreeMap, BTreeSet};

use tessera_core::Identifier;

/// Net effect of a mutation scope on one identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// The identifier did not exist before the scope and does now.
    Added,
    /// The identifier existed before the scope and does not now.
    Removed,
    /// The identifier existed before and after the scope and its object
    /// was modified or replaced.
    Modified,
}

/// Per-identifier net change accumulated during an open scope.
///
/// Coalescing rules:
///
/// | earlier  | later    | net       |
/// |----------|----------|-----------|
/// | added    | modified | added     |
/// | added    | removed  | (nothing) |
/// | removed  | added    | modified  |
/// | modified | removed  | removed   |
#[derive(Clone, Debug)]
pub(crate) struct ChangeLog<K> {
    entries: BTreeMap<K, ChangeKind>,
}

impl<K: Identifier> ChangeLog<K> {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn record_added(&mut self, id: K) {
        let net = match self.entries.get(&id) {
            None => ChangeKind::Added,
            Some(ChangeKind::Removed) => ChangeKind::Modified,
            Some(&kind) => kind,
        };
        self.entries.insert(id, net);
    }

    pub(crate) fn record_removed(&mut self, id: K) {
        match self.entries.get(&id) {
            Some(ChangeKind::Added) => {
                self.entries.remove(&id);
            }
            _ => {
                self.entries.insert(id, ChangeKind::Removed);
            }
        }
    }

    pub(crate) fn record_modified(&mut self, id: K) {
        self.entries.entry(id).or_insert(ChangeKind::Modified);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain the log into a message, leaving the log empty.
    pub(crate) fn take_message(&mut self) -> ChangeMessage<K> {
        let mut message = ChangeMessage::empty();
        for (id, kind) in std::mem::take(&mut self.entries) {
            match kind {
                ChangeKind::Added => message.added.insert(id),
                ChangeKind::Removed => message.removed.insert(id),
                ChangeKind::Modified => message.modified.insert(id),
            };
        }
        message
    }
}

/// Immutable record of one closed mutation scope.
///
/// The three sets are disjoint and describe net effect: an object
/// created and destroyed inside the same scope appears in none of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeMessage<K> {
    added: BTreeSet<K>,
    removed: BTreeSet<K>,
    modified: BTreeSet<K>,
}

impl<K: Identifier> ChangeMessage<K> {
    fn empty() -> Self {
        Self {
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
            modified: BTreeSet::new(),
        }
    }

    /// Identifiers that now exist and did not before the scope.
    pub fn added(&self) -> &BTreeSet<K> {
        &self.added
    }

    /// Identifiers that existed before the scope and are now gone.
    pub fn removed(&self) -> &BTreeSet<K> {
        &self.removed
    }

    /// Identifiers whose objects changed in place.
    pub fn modified(&self) -> &BTreeSet<K> {
        &self.modified
    }

    /// Net change recorded for `id`, if any.
    pub fn change_kind(&self, id: &K) -> Option<ChangeKind> {
        if self.added.contains(id) {
            Some(ChangeKind::Added)
        } else if self.removed.contains(id) {
            Some(ChangeKind::Removed)
        } else if self.modified.contains(id) {
            Some(ChangeKind::Modified)
        } else {
            None
        }
    }

    /// Total number of changed identifiers.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
