// ── Write-path metrics ──────────────────────────────────────────

/// Counter: validation decisions. Labels: outcome (ok, ordering, conflict,
/// configuration).
pub const VALIDATIONS_TOTAL: &str = "incumbent_validations_total";

/// Counter: records committed to a store (creates and updates).
pub const RECORDS_SAVED_TOTAL: &str = "incumbent_records_saved_total";

/// Counter: records removed from a store.
pub const RECORDS_REMOVED_TOTAL: &str = "incumbent_records_removed_total";

/// Outcome label for a validation result.
pub fn outcome_label<I>(result: &Result<(), crate::engine::ValidationFailure<I>>) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(failure) => failure.kind(),
    }
}
