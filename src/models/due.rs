//! Due-set selection: which items are ready to be reviewed at a given instant.
use super::SchedulingState;

/// Returns the ids of items whose next review date has been reached (`<= now`).
///
/// Comparison is on absolute epoch seconds; an item due later today is not due yet.
/// Input order is preserved.
pub fn select_due<'a, I>(items: I, now: i64) -> Vec<i64>
where
    I: IntoIterator<Item = (i64, &'a SchedulingState)>,
{
    items
        .into_iter()
        .filter(|(_, state)| state.is_due(now))
        .map(|(id, _)| id)
        .collect()
}
