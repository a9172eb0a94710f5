//! Keyed entity collection and the key-level diff between two snapshots
//!
//! `Collection<E>` keeps entities in insertion order with an index from
//! [`EntityKey`] to position. `diff_collections` classifies every key of the
//! union as created, dropped or altered and visits keys in sorted order.

use crate::traits::{DiffType, Entity, EntityKey};
use std::collections::{BTreeSet, HashMap};

// =============================================================================
// Generic Entity Collection
// =============================================================================

/// Insertion-ordered collection with O(1) lookup by key.
#[derive(Debug, Clone)]
pub struct Collection<E: Entity> {
    entities: Vec<E>,
    /// Index from entity key to position
    index: HashMap<EntityKey, usize>,
}

impl<E: Entity> Default for Collection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Collection<E> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Push an entity, returns true if inserted, false if the key is taken
    pub fn push(&mut self, entity: E) -> bool {
        let key = entity.key();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entities.len());
        self.entities.push(entity);
        true
    }

    /// Insert or replace by key; a replaced entity keeps its original slot.
    ///
    /// Returns the entity that was replaced, if any.
    pub fn upsert(&mut self, entity: E) -> Option<E> {
        let key = entity.key();
        match self.index.get(&key) {
            Some(&idx) => Some(std::mem::replace(&mut self.entities[idx], entity)),
            None => {
                self.index.insert(key, self.entities.len());
                self.entities.push(entity);
                None
            }
        }
    }

    pub fn get(&self, key: &EntityKey) -> Option<&E> {
        self.index.get(key).map(|&idx| &self.entities[idx])
    }

    pub fn list(&self) -> &[E] {
        &self.entities
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entities.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.index.keys()
    }
}

impl<E: Entity> FromIterator<E> for Collection<E> {
    /// Later entities replace earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut collection = Self::new();
        for entity in iter {
            collection.upsert(entity);
        }
        collection
    }
}

// =============================================================================
// Entity Diff
// =============================================================================

/// A diff entry borrowing the entities it compares
#[derive(Debug, Clone)]
pub struct EntityDiff<'a, E: Entity> {
    pub diff_type: DiffType,
    pub key: EntityKey,
    /// Base entity (Drop/Alter)
    pub left: Option<&'a E>,
    /// Updated entity (Create/Alter)
    pub right: Option<&'a E>,
}

/// Compute the key-level diff between two collections.
///
/// Keys are visited in sorted order. Entities with equal fingerprints on both
/// sides produce no entry.
pub fn diff_collections<'a, E: Entity>(
    left: &'a Collection<E>,
    right: &'a Collection<E>,
) -> Vec<EntityDiff<'a, E>> {
    let keys: BTreeSet<&EntityKey> = left.keys().chain(right.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let diff_type = match (left.get(key), right.get(key)) {
                (None, Some(_)) => DiffType::Create,
                (Some(_), None) => DiffType::Drop,
                (Some(l), Some(r)) if l.fingerprint() != r.fingerprint() => DiffType::Alter,
                _ => return None,
            };
            Some(EntityDiff {
                diff_type,
                key: key.clone(),
                left: left.get(key),
                right: right.get(key),
            })
        })
        .collect()
}
