//! Task completion and next-occurrence spawning.
//!
//! Completing a repeating task never reopens it. The completed row stays as
//! history and, unless the series has ended, a fresh instance is created with
//! the next due date and a copy of the tag set. All writes happen in one
//! store transaction.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::recurrence::{exceeds_end_date, next_due_date};
use crate::storage::TaskStore;
use crate::task::Task;

/// Result of completing a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub completed_task: Task,
    /// The spawned next instance, or `None` if the series ends (or never was one).
    pub next_task: Option<Task>,
}

/// Wall-clock values a completion needs.
///
/// `now` stamps `completed_at`; `today` is the local calendar date that
/// `on_completion` series step from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionClock {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl CompletionClock {
    pub fn system() -> Self {
        let now = Utc::now();
        Self {
            now,
            today: now.with_timezone(&Local).date_naive(),
        }
    }
}

/// Due date the next instance of `task` would get, if any.
///
/// Honors the pattern, the regenerate mode and the inclusive end date, but
/// writes nothing.
pub fn preview_next_due_date(task: &Task, today: NaiveDate) -> Option<NaiveDate> {
    if !task.is_recurring() {
        return None;
    }
    let next = next_due_date(task.due_date, &task.recurrence, today)?;
    if exceeds_end_date(next, &task.recurrence) {
        return None;
    }
    Some(next)
}

/// Complete `task_id` and spawn its next occurrence, using the system clock.
///
/// Returns `Ok(None)` when the task does not exist.
///
/// # Errors
/// Store failures propagate; nothing is written in that case.
pub fn complete_recurring_task<S: TaskStore>(store: &S, task_id: &str) -> Result<Option<CompletionOutcome>> {
    complete_recurring_task_at(store, task_id, CompletionClock::system())
}

/// [`complete_recurring_task`] with an injected clock.
pub fn complete_recurring_task_at<S: TaskStore>(
    store: &S,
    task_id: &str,
    clock: CompletionClock,
) -> Result<Option<CompletionOutcome>> {
    store.in_transaction(|store| {
        let Some(mut task) = store.get_task(task_id)? else {
            debug!(task_id, "complete: task not found");
            return Ok(None);
        };

        if !task.complete(clock.now) {
            debug!(task_id, "complete: already completed, nothing spawned");
            return Ok(Some(CompletionOutcome {
                completed_task: task,
                next_task: None,
            }));
        }
        store.update_task(&task)?;

        let Some(due_date) = preview_next_due_date(&task, clock.today) else {
            if task.is_recurring() {
                info!(task_id, pattern = %task.recurrence.pattern, "series ended");
            }
            return Ok(Some(CompletionOutcome {
                completed_task: task,
                next_task: None,
            }));
        };

        let mut next = task.spawn_next(due_date, clock.now);
        next.sort_order = store.next_sort_order(next.list_id.as_deref())?;
        store.create_task(&next)?;
        store.copy_tags(&task.id, &next.id)?;
        next.tags = task.tags.clone();

        info!(
            task_id,
            next_task_id = %next.id,
            %due_date,
            "spawned next occurrence"
        );
        Ok(Some(CompletionOutcome {
            completed_task: task,
            next_task: Some(next),
        }))
    })
}
