use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, error};

use crate::config::ScopeConfig;
use crate::engine::{active, validate_at, window_of, ValidationFailure};
use crate::model::{Record, SiblingRow, Window};
use crate::observability::{outcome_label, RECORDS_REMOVED_TOTAL, RECORDS_SAVED_TOTAL, VALIDATIONS_TOTAL};
use crate::time::{now_us, Us};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError<I> {
    /// Only records with an identity can be stored.
    MissingId,
    NotFound(I),
    Rejected(ValidationFailure<I>),
}

impl<I> From<ValidationFailure<I>> for StoreError<I> {
    fn from(failure: ValidationFailure<I>) -> Self {
        StoreError::Rejected(failure)
    }
}

impl<I: fmt::Debug> fmt::Display for StoreError<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::MissingId => write!(f, "record has no id"),
            StoreError::NotFound(id) => write!(f, "not found: {id:?}"),
            StoreError::Rejected(failure) => write!(f, "rejected: {failure}"),
        }
    }
}

impl<I: fmt::Debug> std::error::Error for StoreError<I> {}

/// Records sharing one parent, in insertion order.
pub struct ScopeState<R> {
    records: Vec<R>,
}

impl<R> Default for ScopeState<R> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<R: Record> ScopeState<R> {
    fn position(&self, id: &R::Id) -> Option<usize> {
        self.records.iter().position(|r| r.id().as_ref() == Some(id))
    }

    /// Replace in place on update, append on create.
    fn upsert(&mut self, record: R, id: &R::Id) {
        match self.position(id) {
            Some(pos) => self.records[pos] = record,
            None => self.records.push(record),
        }
    }

    fn remove(&mut self, id: &R::Id) -> Option<R> {
        let pos = self.position(id)?;
        Some(self.records.remove(pos))
    }

    /// The shard as a candidate set.
    fn rows(&self, config: &ScopeConfig) -> Vec<SiblingRow<R::Id>> {
        self.records
            .iter()
            .filter_map(|r| {
                let start = config.start_field.as_deref().and_then(|f| r.timestamp(f));
                let finish = config.finish_field.as_deref().and_then(|f| r.timestamp(f));
                Some(SiblingRow::new(r.id()?, start, finish))
            })
            .collect()
    }
}

type ScopeKey<R> = Option<<R as Record>::Parent>;
pub type SharedScopeState<R> = Arc<RwLock<ScopeState<R>>>;

/// A write-locked shard together with the key and handle it was found under.
struct LockedScope<R: Record> {
    key: ScopeKey<R>,
    shard: SharedScopeState<R>,
    guard: OwnedRwLockWriteGuard<ScopeState<R>>,
}

/// In-memory record store for one record type.
///
/// Every write validates against its parent scope while holding that
/// scope's write lock, so two writers in the same scope can never both pass
/// on a stale candidate set.
pub struct ScopeStore<R: Record> {
    config: Arc<ScopeConfig>,
    /// Parent -> shard. Records with no parent live under `None`.
    scopes: DashMap<ScopeKey<R>, SharedScopeState<R>>,
    /// Reverse lookup: record id -> scope key.
    record_to_scope: DashMap<R::Id, ScopeKey<R>>,
}

impl<R> ScopeStore<R>
where
    R: Record + Clone,
    R::Id: Hash,
{
    pub fn new(config: Arc<ScopeConfig>) -> Self {
        Self {
            config,
            scopes: DashMap::new(),
            record_to_scope: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.record_to_scope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_to_scope.is_empty()
    }

    fn scope(&self, key: &ScopeKey<R>) -> SharedScopeState<R> {
        self.scopes.entry(key.clone()).or_default().value().clone()
    }

    fn scope_of(&self, id: &R::Id) -> Option<ScopeKey<R>> {
        self.record_to_scope.get(id).map(|e| e.value().clone())
    }

    async fn lock_scope(&self, key: &ScopeKey<R>) -> LockedScope<R> {
        let shard = self.scope(key);
        let guard = shard.clone().write_owned().await;
        LockedScope { key: key.clone(), shard, guard }
    }

    /// Write-lock `target`, plus `previous` when the record is moving
    /// between scopes. Locks are taken in key order to prevent deadlocks.
    async fn lock_scopes(
        &self,
        target: &ScopeKey<R>,
        previous: Option<&ScopeKey<R>>,
    ) -> (LockedScope<R>, Option<LockedScope<R>>) {
        match previous.filter(|p| *p != target) {
            None => (self.lock_scope(target).await, None),
            Some(prev) => {
                if prev < target {
                    let prev_lock = self.lock_scope(prev).await;
                    (self.lock_scope(target).await, Some(prev_lock))
                } else {
                    let target_lock = self.lock_scope(target).await;
                    (target_lock, Some(self.lock_scope(prev).await))
                }
            }
        }
    }

    /// False once the shard was dropped from the map while we waited on it.
    fn is_current(&self, locked: &LockedScope<R>) -> bool {
        self.scopes
            .get(&locked.key)
            .is_some_and(|e| Arc::ptr_eq(e.value(), &locked.shard))
    }

    /// Forget an emptied shard. Must be called with its write lock held.
    fn release_if_empty(&self, locked: &LockedScope<R>) {
        if locked.guard.records.is_empty() {
            self.scopes
                .remove_if(&locked.key, |_, shard| Arc::ptr_eq(shard, &locked.shard));
        }
    }

    /// Create or update `record`. Nothing changes if validation fails.
    pub async fn save(&self, record: R) -> Result<(), StoreError<R::Id>> {
        let id = record.id().ok_or(StoreError::MissingId)?;
        let target = record.parent(&self.config.parent_accessor);

        loop {
            let previous = self.scope_of(&id);
            let (mut target_lock, previous_lock) = self.lock_scopes(&target, previous.as_ref()).await;
            // A concurrent save may have moved the record, or a shard may
            // have been released, before we locked.
            if self.scope_of(&id) != previous
                || !self.is_current(&target_lock)
                || previous_lock.as_ref().is_some_and(|l| !self.is_current(l))
            {
                continue;
            }

            let rows = target_lock.guard.rows(&self.config);
            let result = validate_at(&record, &self.config, rows.as_slice(), now_us());
            metrics::counter!(VALIDATIONS_TOTAL, "outcome" => outcome_label(&result)).increment(1);
            if let Err(failure) = result {
                if failure.is_fatal() {
                    error!(record = ?id, "scope misconfigured: {failure}");
                } else {
                    debug!(record = ?id, parent = ?target, "write rejected: {failure}");
                }
                self.release_if_empty(&target_lock);
                return Err(failure.into());
            }

            // The id's scope is claimed and committed under one map entry,
            // so first saves of one id into two scopes cannot both land.
            let claim = self.record_to_scope.entry(id.clone());
            let claimed = match &claim {
                Entry::Occupied(e) => Some(e.get()),
                Entry::Vacant(_) => None,
            };
            if claimed != previous.as_ref() {
                drop(claim);
                self.release_if_empty(&target_lock);
                continue;
            }

            if let Some(mut prev) = previous_lock {
                prev.guard.remove(&id);
                self.release_if_empty(&prev);
            }
            target_lock.guard.upsert(record, &id);
            claim.insert(target);
            metrics::counter!(RECORDS_SAVED_TOTAL).increment(1);
            return Ok(());
        }
    }

    pub async fn remove(&self, id: &R::Id) -> Result<R, StoreError<R::Id>> {
        loop {
            let key = self.scope_of(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
            let mut locked = self.lock_scope(&key).await;
            // moved by a concurrent save while we waited
            if self.scope_of(id).as_ref() != Some(&key) || !self.is_current(&locked) {
                continue;
            }
            let record = locked
                .guard
                .remove(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            self.record_to_scope.remove(id);
            self.release_if_empty(&locked);
            metrics::counter!(RECORDS_REMOVED_TOTAL).increment(1);
            return Ok(record);
        }
    }

    pub async fn get(&self, id: &R::Id) -> Option<R> {
        let key = self.scope_of(id)?;
        let scope = self.scopes.get(&key).map(|e| e.value().clone())?;
        let guard = scope.read().await;
        guard.position(id).map(|pos| guard.records[pos].clone())
    }

    /// Snapshot of one parent's records with their windows.
    async fn windows(&self, parent: &R::Parent, now: Us) -> Vec<(R, Window)> {
        let key = Some(parent.clone());
        let Some(scope) = self.scopes.get(&key).map(|e| e.value().clone()) else {
            return Vec::new();
        };
        let guard = scope.read().await;
        guard
            .records
            .iter()
            .map(|r| (r.clone(), window_of(r, &self.config, now)))
            .collect()
    }

    /// Records of `parent` active at `t`.
    pub async fn active_at(&self, parent: &R::Parent, t: Us) -> Vec<R> {
        active::active_at(self.windows(parent, now_us()).await, t)
    }

    /// The record of `parent` active at `t`, for uniquely-active scopes.
    pub async fn active_one(&self, parent: &R::Parent, t: Us) -> Option<R> {
        active::active_one(self.windows(parent, now_us()).await, t)
    }

    /// Records of `parent` active at any point of `[query_start, query_end)`.
    pub async fn active_in(&self, parent: &R::Parent, query_start: Option<Us>, query_end: Option<Us>) -> Vec<R> {
        active::active_in(
            self.windows(parent, now_us()).await,
            query_start,
            query_end,
            self.config.ignore_empty,
        )
    }

    pub async fn active_now(&self, parent: &R::Parent) -> Vec<R> {
        let now = now_us();
        active::active_at(self.windows(parent, now).await, now)
    }

    /// The record of `parent` active right now, for uniquely-active scopes.
    pub async fn active_one_now(&self, parent: &R::Parent) -> Option<R> {
        let now = now_us();
        active::active_one(self.windows(parent, now).await, now)
    }
}
