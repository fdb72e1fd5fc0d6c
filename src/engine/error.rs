use std::fmt;

/// Why a record may not be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure<I> {
    /// Uniqueness is enforced but the named field was never declared.
    Configuration { missing: &'static str },
    /// The finish field holds a value before the start field's.
    Ordering {
        finish_field: String,
        start_field: String,
    },
    /// Siblings in the same scope that would be active at the same time.
    Conflict(Vec<I>),
}

impl<I> ValidationFailure<I> {
    /// A setup defect rather than bad data; never worth retrying or
    /// showing to an end user.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValidationFailure::Configuration { .. })
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationFailure::Configuration { .. } => "configuration",
            ValidationFailure::Ordering { .. } => "ordering",
            ValidationFailure::Conflict(_) => "conflict",
        }
    }
}

/// `left_office_at` -> `Left office at`
fn humanize(field: &str) -> String {
    let spaced = field.trim_end_matches("_id").replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl<I: fmt::Debug> fmt::Display for ValidationFailure<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::Configuration { missing } => {
                write!(f, "uniquely active records must declare {missing}")
            }
            ValidationFailure::Ordering {
                finish_field,
                start_field,
            } => write!(
                f,
                "{} must be after {}",
                humanize(finish_field),
                humanize(start_field)
            ),
            ValidationFailure::Conflict(ids) => {
                write!(f, "active period conflicts with records: {ids:?}")
            }
        }
    }
}

impl<I: fmt::Debug> std::error::Error for ValidationFailure<I> {}
