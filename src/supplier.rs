use std::hash::Hash;

use dashmap::DashMap;

use crate::engine::active;
use crate::model::SiblingRow;
use crate::time::{Precision, Us};

/// Source of the siblings a record is validated against.
///
/// Rows must reflect each sibling's current start/finish values. Whether
/// they come from a live query or a cache is up to the implementation.
pub trait CandidateSupplier<P, I> {
    fn siblings_for(&self, parent: &P, excluding: Option<&I>) -> Vec<SiblingRow<I>>;
}

/// A candidate set already narrowed to one parent scope.
impl<P, I: Clone + PartialEq> CandidateSupplier<P, I> for [SiblingRow<I>] {
    fn siblings_for(&self, _parent: &P, excluding: Option<&I>) -> Vec<SiblingRow<I>> {
        self.iter()
            .filter(|row| excluding.is_none_or(|own| *own != row.id))
            .cloned()
            .collect()
    }
}

impl<P, I: Clone + PartialEq> CandidateSupplier<P, I> for Vec<SiblingRow<I>> {
    fn siblings_for(&self, parent: &P, excluding: Option<&I>) -> Vec<SiblingRow<I>> {
        self.as_slice().siblings_for(parent, excluding)
    }
}

/// Cached sibling snapshots keyed by parent.
///
/// Fill it from whatever owns the records; keep it current with `upsert`
/// and `evict`, or drop a whole scope with `invalidate`. An uncached parent
/// reads as having no siblings.
pub struct SnapshotCache<P, I> {
    scopes: DashMap<P, Vec<SiblingRow<I>>>,
}

impl<P: Eq + Hash, I: Clone + PartialEq> Default for SnapshotCache<P, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Eq + Hash, I: Clone + PartialEq> SnapshotCache<P, I> {
    pub fn new() -> Self {
        Self {
            scopes: DashMap::new(),
        }
    }

    /// Replace the snapshot for `parent`.
    pub fn load(&self, parent: P, rows: Vec<SiblingRow<I>>) {
        self.scopes.insert(parent, rows);
    }

    /// Insert or replace one row, keeping first-insertion order.
    pub fn upsert(&self, parent: P, row: SiblingRow<I>) {
        let mut rows = self.scopes.entry(parent).or_default();
        match rows.iter().position(|r| r.id == row.id) {
            Some(pos) => rows[pos] = row,
            None => rows.push(row),
        }
    }

    pub fn evict(&self, parent: &P, id: &I) -> Option<SiblingRow<I>> {
        let mut rows = self.scopes.get_mut(parent)?;
        let pos = rows.iter().position(|r| r.id == *id)?;
        Some(rows.remove(pos))
    }

    pub fn invalidate(&self, parent: &P) {
        self.scopes.remove(parent);
    }

    pub fn is_cached(&self, parent: &P) -> bool {
        self.scopes.contains_key(parent)
    }

    /// Ids active at `t` in the cached scope.
    pub fn active_at(&self, parent: &P, t: Us, precision: Precision, now: Us) -> Vec<I> {
        let Some(rows) = self.scopes.get(parent) else {
            return Vec::new();
        };
        active::active_at(
            rows.iter().map(|r| (r.id.clone(), r.window(precision, now))),
            t,
        )
    }

    pub fn active_one(&self, parent: &P, t: Us, precision: Precision, now: Us) -> Option<I> {
        let rows = self.scopes.get(parent)?;
        active::active_one(
            rows.iter().map(|r| (r.id.clone(), r.window(precision, now))),
            t,
        )
    }
}

impl<P: Eq + Hash, I: Clone + PartialEq> CandidateSupplier<P, I> for SnapshotCache<P, I> {
    fn siblings_for(&self, parent: &P, excluding: Option<&I>) -> Vec<SiblingRow<I>> {
        match self.scopes.get(parent) {
            Some(rows) => rows.as_slice().siblings_for(parent, excluding),
            None => Vec::new(),
        }
    }
}
