pub mod active;
mod conflict;
mod error;

pub use conflict::detect;
pub use error::ValidationFailure;

use crate::config::ScopeConfig;
use crate::model::{Record, Window};
use crate::supplier::CandidateSupplier;
use crate::time::{now_us, Us};

/// Check `record` may be committed: finish not before start, then (when
/// the type is uniquely active) no sibling active at the same time.
///
/// Runs on every create and every update. Pure: no I/O, no mutation.
pub fn validate<R, S>(record: &R, config: &ScopeConfig, siblings: &S) -> Result<(), ValidationFailure<R::Id>>
where
    R: Record,
    S: CandidateSupplier<R::Parent, R::Id> + ?Sized,
{
    validate_at(record, config, siblings, now_us())
}

/// [`validate`] with an explicit "now", used for unset start fields.
pub fn validate_at<R, S>(
    record: &R,
    config: &ScopeConfig,
    siblings: &S,
    now: Us,
) -> Result<(), ValidationFailure<R::Id>>
where
    R: Record,
    S: CandidateSupplier<R::Parent, R::Id> + ?Sized,
{
    check_ordering(record, config, now)?;
    if config.unique {
        check_collisions(record, config, siblings, now)?;
    }
    Ok(())
}

/// Raw field comparison, no rounding. Equal values are a valid empty period.
fn check_ordering<R: Record>(record: &R, config: &ScopeConfig, now: Us) -> Result<(), ValidationFailure<R::Id>> {
    let (Some(start_field), Some(finish_field)) = (&config.start_field, &config.finish_field) else {
        return Ok(());
    };
    let Some(finish) = record.timestamp(finish_field) else {
        return Ok(());
    };
    let start = record.timestamp(start_field).unwrap_or(now);
    if finish < start {
        return Err(ValidationFailure::Ordering {
            finish_field: finish_field.clone(),
            start_field: start_field.clone(),
        });
    }
    Ok(())
}

fn check_collisions<R, S>(
    record: &R,
    config: &ScopeConfig,
    siblings: &S,
    now: Us,
) -> Result<(), ValidationFailure<R::Id>>
where
    R: Record,
    S: CandidateSupplier<R::Parent, R::Id> + ?Sized,
{
    if let Some(missing) = config.missing_field() {
        return Err(ValidationFailure::Configuration { missing });
    }
    // Not attached to a scope yet: nothing to collide with.
    let Some(parent) = record.parent(&config.parent_accessor) else {
        return Ok(());
    };

    let candidate = window_of(record, config, now);
    let own_id = record.id();
    let rows = siblings.siblings_for(&parent, own_id.as_ref());
    let conflicts = detect(
        &candidate,
        rows.into_iter().map(|row| {
            let window = row.window(config.precision, now);
            (row.id, window)
        }),
        own_id.as_ref(),
        config.ignore_empty,
    );

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure::Conflict(conflicts))
    }
}

/// The record's active window under `config`. Undeclared fields read as
/// unset.
pub fn window_of<R: Record>(record: &R, config: &ScopeConfig, now: Us) -> Window {
    let start = config.start_field.as_deref().and_then(|f| record.timestamp(f));
    let finish = config.finish_field.as_deref().and_then(|f| record.timestamp(f));
    Window::new(start, finish, config.precision, now)
}
