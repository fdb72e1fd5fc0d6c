use crate::model::Window;
use crate::time::Us;

// ── Activity selection over a candidate set ──────────────────────

/// Every item whose window is active at `t`, in input order.
pub fn active_at<T, S>(items: S, t: Us) -> Vec<T>
where
    S: IntoIterator<Item = (T, Window)>,
{
    items
        .into_iter()
        .filter(|(_, window)| window.is_active_at(t))
        .map(|(item, _)| item)
        .collect()
}

/// The first item active at `t`. For uniquely-active scopes this is the
/// only one.
pub fn active_one<T, S>(items: S, t: Us) -> Option<T>
where
    S: IntoIterator<Item = (T, Window)>,
{
    items
        .into_iter()
        .find(|(_, window)| window.is_active_at(t))
        .map(|(item, _)| item)
}

/// Every item whose window intersects `[query_start, query_end)`.
pub fn active_in<T, S>(
    items: S,
    query_start: Option<Us>,
    query_end: Option<Us>,
    ignore_empty: bool,
) -> Vec<T>
where
    S: IntoIterator<Item = (T, Window)>,
{
    items
        .into_iter()
        .filter(|(_, window)| window.overlaps(query_start, query_end, ignore_empty))
        .map(|(item, _)| item)
        .collect()
}
