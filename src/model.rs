use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::time::{round, Precision, Us};

/// Half-open active period `[start, finish)`; no finish means open-ended.
///
/// Derived fresh from a record's fields for each decision and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: Us,
    finish: Option<Us>,
    precision: Precision,
}

impl Window {
    /// An unset `start` means "starting now"; both bounds are rounded to
    /// `precision`.
    pub fn new(start: Option<Us>, finish: Option<Us>, precision: Precision, now: Us) -> Self {
        Self {
            start: round(start.unwrap_or(now), precision),
            finish: finish.map(|f| round(f, precision)),
            precision,
        }
    }

    pub fn start(&self) -> Us {
        self.start
    }

    pub fn finish(&self) -> Option<Us> {
        self.finish
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Zero-length window: `start == finish`.
    pub fn is_empty(&self) -> bool {
        self.finish == Some(self.start)
    }

    pub fn is_open_ended(&self) -> bool {
        self.finish.is_none()
    }

    pub fn is_active_at(&self, t: Us) -> bool {
        let t = round(t, self.precision);
        self.start <= t && self.finish.is_none_or(|f| f > t)
    }

    /// Does this window intersect the half-open query range?
    ///
    /// A missing `query_start` reaches back to the beginning of time, a
    /// missing `query_end` forward to the end of it. Rule order matters: an
    /// ignored empty window must be rejected before any unbounded-query
    /// short-circuit can accept it.
    pub fn overlaps(&self, query_start: Option<Us>, query_end: Option<Us>, ignore_empty: bool) -> bool {
        if ignore_empty && self.is_empty() {
            return false;
        }
        let query_start = query_start.map(|t| round(t, self.precision));
        let query_end = query_end.map(|t| round(t, self.precision));

        match (query_start, query_end, self.finish) {
            (None, None, _) => true,
            (Some(qs), Some(qe), _) if qs == qe => self.is_active_at(qs),
            (None, Some(qe), _) => self.start < qe,
            (Some(qs), None, finish) => finish.is_none_or(|f| f > qs),
            (Some(_), Some(qe), None) => qe > self.start,
            (Some(qs), Some(qe), Some(f)) => self.start < qe && f > qs,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.finish {
            Some(finish) => write!(f, "[{}, {})", self.start, finish),
            None => write!(f, "[{}, ∞)", self.start),
        }
    }
}

/// A sibling as a candidate supplier returns it: identity plus the raw
/// stored values of the start and finish fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingRow<I> {
    pub id: I,
    pub start: Option<Us>,
    pub finish: Option<Us>,
}

impl<I> SiblingRow<I> {
    pub fn new(id: I, start: Option<Us>, finish: Option<Us>) -> Self {
        Self { id, start, finish }
    }

    pub fn window(&self, precision: Precision, now: Us) -> Window {
        Window::new(self.start, self.finish, precision, now)
    }
}

/// Field access a record type exposes to the validation core.
///
/// Field and accessor names are the ones declared in the type's
/// `ScopeConfig`.
pub trait Record {
    type Id: Clone + Eq + fmt::Debug;
    type Parent: Clone + Eq + Ord + Hash + fmt::Debug;

    /// `None` until the record has been persisted.
    fn id(&self) -> Option<Self::Id>;

    fn timestamp(&self, field: &str) -> Option<Us>;

    fn parent(&self, accessor: &str) -> Option<Self::Parent>;
}

/// General-purpose record with named timestamp fields and named parent
/// links, identified by ULIDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenure {
    pub id: Option<Ulid>,
    pub timestamps: BTreeMap<String, Us>,
    pub parents: BTreeMap<String, Ulid>,
}

impl Tenure {
    pub fn new(id: Ulid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn set(mut self, field: &str, value: Us) -> Self {
        self.timestamps.insert(field.to_string(), value);
        self
    }

    pub fn belonging_to(mut self, accessor: &str, parent: Ulid) -> Self {
        self.parents.insert(accessor.to_string(), parent);
        self
    }

    /// Clear a field, leaving it unset.
    pub fn unset(mut self, field: &str) -> Self {
        self.timestamps.remove(field);
        self
    }
}

impl Record for Tenure {
    type Id = Ulid;
    type Parent = Ulid;

    fn id(&self) -> Option<Ulid> {
        self.id
    }

    fn timestamp(&self, field: &str) -> Option<Us> {
        self.timestamps.get(field).copied()
    }

    fn parent(&self, accessor: &str) -> Option<Ulid> {
        self.parents.get(accessor).copied()
    }
}
