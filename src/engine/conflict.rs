use crate::model::Window;

/// Ids of every sibling whose window overlaps `candidate`, in input order.
///
/// The sibling carrying `self_id` is the candidate's own stored state and
/// never conflicts. With `ignore_empty`, zero-length windows take no part on
/// either side.
pub fn detect<I, S>(candidate: &Window, siblings: S, self_id: Option<&I>, ignore_empty: bool) -> Vec<I>
where
    I: PartialEq,
    S: IntoIterator<Item = (I, Window)>,
{
    if ignore_empty && candidate.is_empty() {
        return Vec::new();
    }

    let mut conflicts = Vec::new();
    for (id, sibling) in siblings {
        if self_id.is_some_and(|own| *own == id) {
            continue;
        }
        if ignore_empty && sibling.is_empty() {
            continue;
        }
        // starts before the candidate finishes...
        let starts_in_time = candidate.finish().is_none_or(|f| sibling.start() < f);
        // ...and finishes after the candidate starts
        let finishes_in_time = sibling.finish().is_none_or(|f| f > candidate.start());
        if starts_in_time && finishes_in_time {
            conflicts.push(id);
        }
    }
    conflicts
}
