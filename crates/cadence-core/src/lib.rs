//! # Cadence Core Library
//!
//! Recurrence and reminder engine for a personal task manager. The CLI and
//! any desktop shell are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Recurrence**: pure date arithmetic that yields the next due date of a
//!   repeating task
//! - **Completion**: marks a task done and spawns its next occurrence in one
//!   store transaction
//! - **Reminders**: an in-process timer table plus a periodic sweep that
//!   catches anything the timers missed
//! - **Storage**: SQLite-backed task and reminder stores, TOML configuration
//!
//! ## Key Components
//!
//! - [`compute_next_date`]: next occurrence of a pattern from an anchor date
//! - [`complete_recurring_task`]: completion orchestration
//! - [`ReminderScheduler`]: schedule, snooze, cancel, and deliver reminders
//! - [`ReminderDeliveryFallback`]: sweep for lost timers
//! - [`Database`]: persistence
//! - [`Config`]: application configuration

pub mod completion;
pub mod error;
pub mod notify;
pub mod recurrence;
pub mod reminder;
pub mod storage;
pub mod task;

pub use completion::{
    complete_recurring_task, complete_recurring_task_at, preview_next_due_date, CompletionClock,
    CompletionOutcome,
};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use notify::{LogSink, Notification, NotificationSink, Urgency};
pub use recurrence::{compute_next_date, exceeds_end_date, next_due_date, resolve_next_weekday};
pub use reminder::{DeliveryOutcome, Reminder, ReminderDeliveryFallback, ReminderScheduler, SweepReport};
pub use storage::{Config, Database, ReminderStore, TaskStore};
pub use task::{Priority, RecurrencePattern, RecurrenceRule, RegenerateMode, Task};
