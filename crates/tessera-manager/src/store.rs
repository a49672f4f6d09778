//! Ordered identifier-keyed container.
//!
//! [`IdentifierStore`] is a plain container with no side effects: it
//! maps identifiers to owned values, rejects duplicates, and iterates in
//! identifier order. Managers layer ownership and notification on top.

use std::collections::BTreeMap;

use tessera_core::{Identifier, ObjectError, SequentialIdentifier};

/// Ordered map from identifier to owned value.
///
/// Backed by a `BTreeMap` so lookups are O(log n) and iteration follows
/// the identifier's `Ord`, which is what persistence and UI listings
/// expect.
#[derive(Clone, Debug)]
pub struct IdentifierStore<K, V> {
    entries: BTreeMap<K, V>,
}

impl<K: Identifier, V> IdentifierStore<K, V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert a value under `id`.
    ///
    /// Fails with [`ObjectError::DuplicateIdentifier`] if `id` is already
    /// present; the existing entry is left in place.
    pub fn insert(&mut self, id: K, value: V) -> Result<(), ObjectError> {
        if self.entries.contains_key(&id) {
            return Err(ObjectError::duplicate(&id));
        }
        self.entries.insert(id, value);
        Ok(())
    }

    /// Detach and return the value stored under `id`.
    pub fn remove(&mut self, id: &K) -> Result<V, ObjectError> {
        self.entries
            .remove(id)
            .ok_or_else(|| ObjectError::not_found(id))
    }

    /// Look up the value stored under `id`.
    pub fn find(&self, id: &K) -> Option<&V> {
        self.entries.get(id)
    }

    /// Whether `id` is present.
    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    /// Iterate over identifiers in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Iterate over values in identifier order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }
}

impl<K: SequentialIdentifier, V> IdentifierStore<K, V> {
    /// Smallest unused identifier whose index is at least `floor`.
    ///
    /// Walks the occupied run starting at `floor` until the first gap.
    /// Returns `None` only when every index from `floor` to `u32::MAX`
    /// is taken.
    pub fn first_free_from(&self, floor: u32) -> Option<K> {
        let mut candidate = floor;
        for key in self.entries.range(K::from_index(floor)..).map(|(k, _)| k) {
            if key.index() != candidate {
                break;
            }
            candidate = candidate.checked_add(1)?;
        }
        Some(K::from_index(candidate))
    }
}

impl<K: Identifier, V> Default for IdentifierStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
