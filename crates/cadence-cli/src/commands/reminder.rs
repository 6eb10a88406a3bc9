//! Reminder commands for CLI.
//!
//! Timers registered here live only as long as this process; `cadence run`
//! picks new and changed reminders up through its sweep.

use cadence_core::storage::ReminderStore;
use cadence_core::{Config, Database, Reminder};
use chrono::{Duration, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::common::{self, CliResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Add a reminder to a task
    Add {
        /// Task ID
        task_id: String,
        /// Fire time as RFC 3339 (e.g. 2024-03-10T09:00:00Z)
        #[arg(long, conflicts_with = "in_minutes", required_unless_present = "in_minutes")]
        at: Option<String>,
        /// Fire this many minutes from now
        #[arg(long)]
        in_minutes: Option<u32>,
    },
    /// List reminders
    List {
        /// Only reminders of this task
        #[arg(long)]
        task: Option<String>,
        /// Only untriggered reminders
        #[arg(long)]
        pending: bool,
    },
    /// Push a reminder into the future
    Snooze {
        /// Reminder ID
        id: String,
        /// Minutes to snooze (default from config)
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Mark a reminder as handled without notifying
    Dismiss {
        /// Reminder ID
        id: String,
    },
    /// Delete a reminder
    Delete {
        /// Reminder ID
        id: String,
    },
}

pub fn run(action: ReminderAction) -> CliResult {
    let config = Config::load()?;
    match action {
        ReminderAction::Add {
            task_id,
            at,
            in_minutes,
        } => {
            let reminder_time = match (at, in_minutes) {
                (Some(at), _) => common::parse_instant(&at)?,
                (None, Some(minutes)) => Utc::now()
                    .checked_add_signed(Duration::minutes(i64::from(minutes)))
                    .ok_or(format!("--in-minutes {minutes} is out of range"))?,
                (None, None) => return Err("either --at or --in-minutes is required".into()),
            };
            let scheduler = common::open_scheduler(&config)?;
            let reminder = scheduler
                .add_and_schedule(&task_id, reminder_time)?
                .ok_or(format!("task not found: {task_id}"))?;
            scheduler.shutdown();
            common::print_json(&reminder)?;
        }
        ReminderAction::List { task, pending } => {
            let db = Database::open()?;
            let reminders: Vec<Reminder> = match task {
                Some(task_id) => db.reminders_for_task(&task_id)?,
                None => db.list_reminders()?,
            };
            let reminders: Vec<Reminder> = reminders.into_iter().filter(|r| !pending || !r.triggered).collect();
            common::print_json(&reminders)?;
        }
        ReminderAction::Snooze { id, minutes } => {
            let minutes = minutes.unwrap_or(config.reminders.default_snooze_minutes);
            let scheduler = common::open_scheduler(&config)?;
            let reminder = scheduler.snooze(&id, minutes)?.ok_or(format!("reminder not found: {id}"))?;
            scheduler.shutdown();
            common::print_json(&reminder)?;
        }
        ReminderAction::Dismiss { id } => {
            let db = Database::open()?;
            if db.get_reminder(&id)?.is_none() {
                return Err(format!("reminder not found: {id}").into());
            }
            let changed = db.mark_triggered(&id)?;
            common::print_json(&json!({ "reminder_id": id, "dismissed": changed }))?;
        }
        ReminderAction::Delete { id } => {
            let scheduler = common::open_scheduler(&config)?;
            let deleted = scheduler.delete(&id)?;
            common::print_json(&json!({ "reminder_id": id, "deleted": deleted }))?;
        }
    }
    Ok(())
}
