//! Record stores used by the temporal subsystem.
//!
//! The subsystem only talks to [`TaskStore`] and [`ReminderStore`];
//! [`Database`] is the SQLite-backed implementation of both.

mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, NotificationsConfig, RemindersConfig};
pub use database::Database;

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::reminder::Reminder;
use crate::task::Task;

/// Task persistence as needed by completion and reminder delivery.
pub trait TaskStore {
    fn get_task(&self, id: &str) -> Result<Option<Task>>;

    /// Insert a task together with its tag set.
    fn create_task(&self, task: &Task) -> Result<()>;

    /// Overwrite the task's columns (tags untouched). Returns false if the
    /// row does not exist.
    fn update_task(&self, task: &Task) -> Result<bool>;

    /// Copy every tag association of `from_id` onto `to_id`. The source
    /// keeps its own associations. Returns the number of tags copied.
    fn copy_tags(&self, from_id: &str, to_id: &str) -> Result<usize>;

    /// Sort position that places a new task last in `list_id`.
    fn next_sort_order(&self, list_id: Option<&str>) -> Result<i64>;

    /// Delete a task; its reminders and tag links go with it.
    fn delete_task(&self, id: &str) -> Result<bool>;

    /// Run `f` so that either all of its writes land or none do.
    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
        Self: Sized;
}

/// Reminder persistence.
pub trait ReminderStore {
    fn get_reminder(&self, id: &str) -> Result<Option<Reminder>>;

    fn create_reminder(&self, reminder: &Reminder) -> Result<()>;

    /// Returns false if the row does not exist.
    fn update_reminder(&self, reminder: &Reminder) -> Result<bool>;

    fn delete_reminder(&self, id: &str) -> Result<bool>;

    /// Set `triggered = true`. Returns true only for the call that flipped
    /// it, so concurrent delivery paths can tell who won.
    fn mark_triggered(&self, id: &str) -> Result<bool>;

    /// Untriggered reminders not held back by a future snooze, regardless
    /// of fire time. Used to rebuild the job table at startup.
    fn pending_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>>;

    /// Pending reminders whose fire time has passed.
    fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>>;

    fn reminders_for_task(&self, task_id: &str) -> Result<Vec<Reminder>>;
}

/// Returns the data directory, creating it if needed.
///
/// `CADENCE_DATA_DIR` wins when set. Otherwise `~/.config/cadence/`, or
/// `~/.config/cadence-dev/` with `CADENCE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("CADENCE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CADENCE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cadence-dev")
            } else {
                base_dir.join("cadence")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
