//! Task management commands for CLI.

use cadence_core::storage::TaskStore;
use cadence_core::{
    complete_recurring_task, preview_next_due_date, CompletionClock, Config, Database, Priority, RecurrencePattern,
    RecurrenceRule, RegenerateMode, Task,
};
use clap::Subcommand;
use serde_json::json;

use crate::common::{self, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// List ID to file the task under
        #[arg(long = "list")]
        list_id: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Due time (HH:MM)
        #[arg(long)]
        time: Option<String>,
        /// none, low, medium or high
        #[arg(long, default_value = "none")]
        priority: Priority,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Recurrence: none, daily, weekly, monthly, yearly or custom
        #[arg(long, default_value = "none")]
        repeat: RecurrencePattern,
        /// Step size in pattern units
        #[arg(long, default_value_t = 1)]
        every: u32,
        /// Comma-separated weekdays for weekly, 0=Sunday .. 6=Saturday
        #[arg(long)]
        weekdays: Option<String>,
        /// Last date an occurrence may fall on (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// fixed or on-completion
        #[arg(long, default_value = "fixed")]
        mode: RegenerateMode,
    },
    /// Show a task
    Get {
        /// Task ID
        id: String,
    },
    /// List tasks
    List {
        /// Only tasks in this list
        #[arg(long = "list")]
        list_id: Option<String>,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Complete a task, spawning the next occurrence of a series
    Complete {
        /// Task ID
        id: String,
    },
    /// Show the due date the next occurrence would get
    Preview {
        /// Task ID
        id: String,
    },
    /// Delete a task and its reminders
    Delete {
        /// Task ID
        id: String,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    match action {
        TaskAction::Add {
            title,
            description,
            notes,
            list_id,
            due,
            time,
            priority,
            tags,
            repeat,
            every,
            weekdays,
            until,
            mode,
        } => {
            let db = Database::open()?;
            let mut task = Task::new(title);
            task.description = description;
            task.notes = notes;
            task.list_id = list_id;
            task.due_date = due.as_deref().map(common::parse_date).transpose()?;
            task.due_time = time.as_deref().map(common::parse_time).transpose()?;
            task.priority = priority;
            task.tags = tags.as_deref().map(common::split_list).unwrap_or_default();

            let mut rule = RecurrenceRule::every(repeat, every).mode(mode);
            if let Some(weekdays) = weekdays {
                rule = rule.with_weekdays(parse_weekdays(&weekdays)?);
            }
            if let Some(until) = until {
                rule = rule.until(common::parse_date(&until)?);
            }
            task.recurrence = rule;
            task.sort_order = db.next_sort_order(task.list_id.as_deref())?;

            db.create_task(&task)?;
            common::print_json(&task)?;
        }
        TaskAction::Get { id } => {
            let db = Database::open()?;
            let task = db.get_task(&id)?.ok_or(format!("task not found: {id}"))?;
            common::print_json(&task)?;
        }
        TaskAction::List { list_id, all } => {
            let db = Database::open()?;
            let tasks: Vec<Task> = db
                .list_tasks()?
                .into_iter()
                .filter(|t| all || !t.completed)
                .filter(|t| list_id.is_none() || t.list_id == list_id)
                .collect();
            common::print_json(&tasks)?;
        }
        TaskAction::Complete { id } => {
            let db = Database::open()?;
            let outcome = complete_recurring_task(&db, &id)?.ok_or(format!("task not found: {id}"))?;
            common::print_json(&outcome)?;
        }
        TaskAction::Preview { id } => {
            let db = Database::open()?;
            let task = db.get_task(&id)?.ok_or(format!("task not found: {id}"))?;
            let next = preview_next_due_date(&task, CompletionClock::system().today);
            common::print_json(&json!({ "task_id": task.id, "next_due_date": next }))?;
        }
        TaskAction::Delete { id } => {
            let scheduler = common::open_scheduler(&Config::load()?)?;
            let deleted = scheduler.delete_task(&id)?;
            common::print_json(&json!({ "task_id": id, "deleted": deleted }))?;
        }
    }
    Ok(())
}

fn parse_weekdays(value: &str) -> CliResult<Vec<u8>> {
    common::split_list(value)
        .iter()
        .map(|d| match d.parse::<u8>() {
            Ok(day) if day <= 6 => Ok(day),
            _ => Err(format!("invalid weekday '{d}', expected 0-6").into()),
        })
        .collect()
}
