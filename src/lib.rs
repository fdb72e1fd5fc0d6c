//! Temporal-validity checks for records that are "active" over a half-open
//! period `[start, finish)` within a parent scope: finish never precedes
//! start, and (when configured) at most one sibling is active at any instant.

pub mod config;
pub mod engine;
pub mod model;
pub mod observability;
pub mod registry;
pub mod store;
pub mod supplier;
pub mod time;

pub use config::{ConfigError, ScopeConfig};
pub use engine::{detect, validate, validate_at, ValidationFailure};
pub use model::{Record, SiblingRow, Tenure, Window};
pub use registry::Registry;
pub use store::{ScopeStore, StoreError};
pub use supplier::{CandidateSupplier, SnapshotCache};
pub use time::{Precision, Us};
