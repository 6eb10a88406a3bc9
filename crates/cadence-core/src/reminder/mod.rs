//! Reminders and their delivery.
//!
//! ## Lifecycle
//!
//! ```text
//! Scheduled -> Fired -> Triggered          (terminal)
//! Scheduled -> Cancelled                   (job gone, row kept)
//! Scheduled -> Snoozed -> Scheduled
//! any non-terminal -> Deleted              (terminal)
//! ```
//!
//! The stored `triggered` flag is the only durable state. Live timers are
//! held by [`ReminderScheduler`] and rebuilt from the store on startup;
//! [`ReminderDeliveryFallback`] sweeps for anything the timers missed.

mod fallback;
mod scheduler;

pub use fallback::{ReminderDeliveryFallback, SweepReport};
pub use scheduler::{DeliveryOutcome, ReminderScheduler};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Reject instants outside years 0..=9999.
///
/// Stored instants are compared as fixed-width text, which only holds for
/// four-digit years.
pub fn check_reminder_time(at: DateTime<Utc>) -> Result<(), ValidationError> {
    if (0..=9999).contains(&at.year()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: "reminder_time".into(),
            message: format!("{at} is outside the supported range"),
        })
    }
}

/// A stored reminder attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    /// Owning task; the reminder is deleted with it
    pub task_id: String,
    /// Instant the notification should fire
    pub reminder_time: DateTime<Utc>,
    pub triggered: bool,
    /// Set by snooze; equals `reminder_time` right after snoozing
    pub snoozed_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(task_id: impl Into<String>, reminder_time: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            reminder_time,
            triggered: false,
            snoozed_until: None,
            created_at: Utc::now(),
        }
    }

    /// Not triggered and not held back by a snooze that ends after `now`.
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        !self.triggered && self.snoozed_until.map_or(true, |until| until <= now)
    }

    /// Pending and its fire time has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_pending(now) && self.reminder_time <= now
    }

    /// Push the fire time to `now + minutes` and re-arm.
    ///
    /// Leaves the reminder untouched if the new time would be out of range.
    pub fn snooze(&mut self, now: DateTime<Utc>, minutes: u32) -> Result<(), ValidationError> {
        let until = now
            .checked_add_signed(Duration::minutes(i64::from(minutes)))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "snooze_minutes".into(),
                message: format!("{minutes} minutes overflows"),
            })?;
        check_reminder_time(until)?;
        self.reminder_time = until;
        self.snoozed_until = Some(until);
        self.triggered = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snooze_rearms_a_triggered_reminder() {
        let now = Utc::now();
        let mut reminder = Reminder::new("task-1", now - Duration::minutes(5));
        reminder.triggered = true;

        reminder.snooze(now, 15).unwrap();
        assert!(!reminder.triggered);
        assert_eq!(reminder.reminder_time, now + Duration::minutes(15));
        assert_eq!(reminder.snoozed_until, Some(reminder.reminder_time));
    }

    #[test]
    fn future_snooze_is_not_pending() {
        let now = Utc::now();
        let mut reminder = Reminder::new("task-1", now);
        reminder.snooze(now, 10).unwrap();
        assert!(!reminder.is_pending(now));
        assert!(reminder.is_pending(now + Duration::minutes(10)));
    }

    #[test]
    fn snooze_past_year_9999_is_rejected() {
        let now = Utc::now();
        let mut reminder = Reminder::new("task-1", now);
        reminder.triggered = true;

        assert!(reminder.snooze(now, u32::MAX).is_err());
        assert!(reminder.triggered);
        assert_eq!(reminder.reminder_time, now);
        assert!(reminder.snoozed_until.is_none());
    }

    #[test]
    fn due_requires_past_fire_time() {
        let now = Utc::now();
        let reminder = Reminder::new("task-1", now + Duration::seconds(30));
        assert!(reminder.is_pending(now));
        assert!(!reminder.is_due(now));
        assert!(reminder.is_due(now + Duration::seconds(30)));
    }
}
