//! Recurrence due-date calculation.
//!
//! [`compute_next_date`] is pure: it only sees the anchor it is given.
//! [`next_due_date`] chooses that anchor from the task's regenerate mode and
//! a caller-supplied `today`, which is the only place the wall clock enters.
//!
//! ## Month-length overflow
//!
//! Monthly and yearly steps keep the day-of-month and clamp to the last day
//! of the target month when it is shorter:
//!
//! ```text
//! 2024-01-31 + 1 month  = 2024-02-29
//! 2023-01-31 + 1 month  = 2023-02-28
//! 2024-02-29 + 1 year   = 2025-02-28
//! ```
//!
//! The clamp does not stick: a series anchored on the 31st that was clamped
//! to Feb 29 continues from Feb 29 under `fixed_schedule`.

mod weekday;

pub use weekday::resolve_next_weekday;

use chrono::{Days, Months, NaiveDate};

use crate::task::{normalize_weekdays, RecurrencePattern, RecurrenceRule, RegenerateMode};

/// Next date after `anchor` for the given cadence, or `None` when the
/// series ends here (no pattern, interval below 1, or date overflow).
pub fn compute_next_date(
    anchor: NaiveDate,
    pattern: RecurrencePattern,
    interval: u32,
    weekdays: &[u8],
) -> Option<NaiveDate> {
    if interval < 1 {
        return None;
    }
    match pattern {
        RecurrencePattern::None => None,
        RecurrencePattern::Daily | RecurrencePattern::Custom => {
            anchor.checked_add_days(Days::new(u64::from(interval)))
        }
        RecurrencePattern::Weekly => {
            // Out-of-range entries are dropped; nothing left means plain weeks.
            let weekdays = normalize_weekdays(weekdays.iter().copied());
            if weekdays.is_empty() {
                anchor.checked_add_days(Days::new(7 * u64::from(interval)))
            } else {
                resolve_next_weekday(anchor, &weekdays, interval)
            }
        }
        // chrono clamps to the last valid day of the target month.
        RecurrencePattern::Monthly => anchor.checked_add_months(Months::new(interval)),
        RecurrencePattern::Yearly => anchor.checked_add_months(Months::new(interval.checked_mul(12)?)),
    }
}

/// Next due date for a series whose current instance is due `current_due`.
///
/// `fixed_schedule` steps from `current_due`; `on_completion` steps from
/// `today`. Either way a missing `current_due` means there is no anchor and
/// the series does not continue.
pub fn next_due_date(
    current_due: Option<NaiveDate>,
    rule: &RecurrenceRule,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let current_due = current_due?;
    let base = match rule.regenerate_mode {
        RegenerateMode::FixedSchedule => current_due,
        RegenerateMode::OnCompletion => today,
    };
    compute_next_date(base, rule.pattern, rule.interval, &rule.weekdays)
}

/// True when `next` falls after the rule's inclusive end date.
pub fn exceeds_end_date(next: NaiveDate, rule: &RecurrenceRule) -> bool {
    rule.end_date.is_some_and(|end| next > end)
}
