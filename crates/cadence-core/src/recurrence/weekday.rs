//! Next-date resolution for weekly series with an explicit weekday set.

use chrono::{Datelike, Days, NaiveDate};

use crate::task::normalize_weekdays;

/// Resolve the next date after `base` that falls on one of `weekdays`
/// (0=Sunday .. 6=Saturday, any order) under a `weeks_interval` cadence.
/// Duplicates and values above 6 are ignored.
///
/// With a one-week cadence the nearest later weekday of the same week wins.
/// Otherwise the result is the first listed weekday of the week that starts
/// `weeks_interval` weeks ahead, so `{Mon}` every 2 weeks from a Monday lands
/// 14 days later, never 7. The result is always strictly after `base`.
///
/// Returns `None` for an empty set, a zero interval or date overflow.
pub fn resolve_next_weekday(base: NaiveDate, weekdays: &[u8], weeks_interval: u32) -> Option<NaiveDate> {
    let weekdays = normalize_weekdays(weekdays.iter().copied());
    let first = *weekdays.first()?;
    if weeks_interval < 1 {
        return None;
    }
    let current = base.weekday().num_days_from_sunday() as u8;

    if weeks_interval == 1 {
        if let Some(later) = weekdays.iter().find(|d| **d > current) {
            return base.checked_add_days(Days::new(u64::from(later - current)));
        }
    }

    let mut days_to_first = (7 + u64::from(first) - u64::from(current)) % 7;
    if days_to_first == 0 {
        days_to_first = 7;
    }
    let extra_weeks = u64::from(weeks_interval - 1) * 7;
    base.checked_add_days(Days::new(days_to_first + extra_weeks))
}
