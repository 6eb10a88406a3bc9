//! Notification sink boundary.
//!
//! The scheduler builds a [`Notification`] and hands it to a
//! [`NotificationSink`]. Rendering and click handling belong to whoever
//! implements the sink (desktop shell, CLI, tests).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reminder::Reminder;
use crate::task::{Priority, Task};

/// How loudly a notification should present itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    Critical,
}

/// A reminder notification ready to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub reminder_id: String,
    pub task_id: String,
    /// Task title, shown as the notification title
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
}

impl Notification {
    /// Build the notification for `reminder` from the task as it is *now*.
    pub fn for_reminder(reminder: &Reminder, task: &Task, escalate_high_priority: bool) -> Self {
        let urgency = if escalate_high_priority && task.priority == Priority::High {
            Urgency::Critical
        } else {
            Urgency::Normal
        };
        let body = match (task.due_date, task.due_time) {
            (Some(date), Some(time)) => format!("Due {date} {}", time.format("%H:%M")),
            (Some(date), None) => format!("Due {date}"),
            _ => "Reminder".to_string(),
        };
        Self {
            reminder_id: reminder.id.clone(),
            task_id: task.id.clone(),
            title: task.title.clone(),
            body,
            urgency,
        }
    }
}

/// Destination for delivered reminders.
///
/// Returning an error leaves the reminder untriggered so the fallback sweep
/// retries it.
pub trait NotificationSink: Send + Sync {
    fn show(&self, notification: &Notification) -> Result<()>;
}

/// Sink that only records deliveries in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn show(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            reminder_id = %notification.reminder_id,
            task_id = %notification.task_id,
            urgency = ?notification.urgency,
            "{}: {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}
