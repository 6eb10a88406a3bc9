//! SQLite-based storage for tasks, tags, and reminders.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::warn;

use super::migrations;
use super::{data_dir, ReminderStore, TaskStore};
use crate::error::{DatabaseError, Result};
use crate::reminder::{check_reminder_time, Reminder};
use crate::task::{normalize_weekdays, RecurrenceRule, Task};

const TASK_COLUMNS: &str = "id, title, description, notes, list_id, due_date, due_time, priority,
     completed, completed_at, sort_order, recurrence_pattern, recurrence_interval,
     recurrence_weekdays, recurrence_end_date, regenerate_mode, created_at, updated_at";

const REMINDER_COLUMNS: &str = "id, task_id, reminder_time, triggered, snoozed_until, created_at";

// === Helper Functions ===

/// Fixed-width UTC form so stored instants sort lexically.
fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_instant(idx: usize, value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_opt_instant(idx: usize, value: Option<String>) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    value.map(|v| parse_instant(idx, &v)).transpose()
}

fn parse_column<T>(idx: usize, value: &str) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| conversion_error(idx, e))
}

fn check_storable(reminder: &Reminder) -> Result<()> {
    check_reminder_time(reminder.reminder_time)?;
    if let Some(until) = reminder.snoozed_until {
        check_reminder_time(until)?;
    }
    Ok(())
}

/// Build a Task from a row selected with `TASK_COLUMNS` (tags not loaded).
fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
    let due_date = row
        .get::<_, Option<String>>(5)?
        .map(|v| parse_column::<NaiveDate>(5, &v))
        .transpose()?;
    let due_time = row
        .get::<_, Option<String>>(6)?
        .map(|v| parse_column::<NaiveTime>(6, &v))
        .transpose()?;
    let weekdays_json: String = row.get(13)?;
    let weekdays: Vec<u8> = serde_json::from_str(&weekdays_json).map_err(|e| conversion_error(13, e))?;
    let end_date = row
        .get::<_, Option<String>>(14)?
        .map(|v| parse_column::<NaiveDate>(14, &v))
        .transpose()?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        notes: row.get(3)?,
        list_id: row.get(4)?,
        due_date,
        due_time,
        priority: parse_column(7, &row.get::<_, String>(7)?)?,
        completed: row.get(8)?,
        completed_at: parse_opt_instant(9, row.get(9)?)?,
        sort_order: row.get(10)?,
        tags: Vec::new(),
        recurrence: RecurrenceRule {
            pattern: parse_column(11, &row.get::<_, String>(11)?)?,
            interval: row.get(12)?,
            weekdays: normalize_weekdays(weekdays),
            end_date,
            regenerate_mode: parse_column(15, &row.get::<_, String>(15)?)?,
        },
        created_at: parse_instant(16, &row.get::<_, String>(16)?)?,
        updated_at: parse_instant(17, &row.get::<_, String>(17)?)?,
    })
}

fn row_to_reminder(row: &rusqlite::Row) -> Result<Reminder, rusqlite::Error> {
    Ok(Reminder {
        id: row.get(0)?,
        task_id: row.get(1)?,
        reminder_time: parse_instant(2, &row.get::<_, String>(2)?)?,
        triggered: row.get(3)?,
        snoozed_until: parse_opt_instant(4, row.get(4)?)?,
        created_at: parse_instant(5, &row.get::<_, String>(5)?)?,
    })
}

/// SQLite database holding tasks, their tags, and reminders.
///
/// Not `Sync`; share it across tasks behind a `Mutex`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/cadence.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("cadence.db"))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    fn load_task_tags(&self, task_id: &str) -> Result<Vec<String>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag FROM task_tags WHERE task_id = ?1 ORDER BY tag ASC")?;
        let mut rows = stmt.query(params![task_id])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            values.push(row.get(0)?);
        }
        Ok(values)
    }

    /// Replace the tag set of a task.
    pub fn set_task_tags(&self, task_id: &str, tags: &[String]) -> Result<()> {
        self.conn
            .execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;
        for tag in tags {
            self.conn.execute(
                "INSERT OR IGNORE INTO task_tags (task_id, tag) VALUES (?1, ?2)",
                params![task_id, tag],
            )?;
        }
        Ok(())
    }

    /// All tasks, ordered by list and position.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY list_id ASC, sort_order ASC, created_at ASC"
        ))?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        tasks
            .into_iter()
            .map(|mut task| -> Result<Task> {
                task.tags = self.load_task_tags(&task.id)?;
                Ok(task)
            })
            .collect()
    }

    /// Every reminder, soonest first.
    pub fn list_reminders(&self) -> Result<Vec<Reminder>> {
        self.query_reminders(
            &format!("SELECT {REMINDER_COLUMNS} FROM reminders ORDER BY reminder_time ASC"),
            params![],
        )
    }

    /// Rows that fail to decode are logged and left out.
    fn query_reminders(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            match row_to_reminder(row) {
                Ok(reminder) => reminders.push(reminder),
                Err(e) => {
                    let id: Option<String> = row.get(0).ok();
                    warn!(reminder_id = ?id, error = %DatabaseError::from(e), "skipping undecodable reminder row");
                }
            }
        }
        Ok(reminders)
    }
}

impl TaskStore for Database {
    fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()?;
        match task {
            Some(mut task) => {
                task.tags = self.load_task_tags(&task.id)?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    fn create_task(&self, task: &Task) -> Result<()> {
        let weekdays_json = serde_json::to_string(&task.recurrence.weekdays)?;
        self.conn.execute(
            &format!(
                "INSERT INTO tasks ({TASK_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
            ),
            params![
                task.id,
                task.title,
                task.description,
                task.notes,
                task.list_id,
                task.due_date.map(|d| d.to_string()),
                task.due_time.map(|t| t.to_string()),
                task.priority.as_str(),
                task.completed,
                task.completed_at.as_ref().map(format_instant),
                task.sort_order,
                task.recurrence.pattern.as_str(),
                task.recurrence.interval,
                weekdays_json,
                task.recurrence.end_date.map(|d| d.to_string()),
                task.recurrence.regenerate_mode.as_str(),
                format_instant(&task.created_at),
                format_instant(&task.updated_at),
            ],
        )?;
        self.set_task_tags(&task.id, &task.tags)?;
        Ok(())
    }

    fn update_task(&self, task: &Task) -> Result<bool> {
        let weekdays_json = serde_json::to_string(&task.recurrence.weekdays)?;
        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?2, description = ?3, notes = ?4, list_id = ?5, due_date = ?6,
                 due_time = ?7, priority = ?8, completed = ?9, completed_at = ?10,
                 sort_order = ?11, recurrence_pattern = ?12, recurrence_interval = ?13,
                 recurrence_weekdays = ?14, recurrence_end_date = ?15, regenerate_mode = ?16,
                 updated_at = ?17
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.description,
                task.notes,
                task.list_id,
                task.due_date.map(|d| d.to_string()),
                task.due_time.map(|t| t.to_string()),
                task.priority.as_str(),
                task.completed,
                task.completed_at.as_ref().map(format_instant),
                task.sort_order,
                task.recurrence.pattern.as_str(),
                task.recurrence.interval,
                weekdays_json,
                task.recurrence.end_date.map(|d| d.to_string()),
                task.recurrence.regenerate_mode.as_str(),
                format_instant(&task.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    fn copy_tags(&self, from_id: &str, to_id: &str) -> Result<usize> {
        let copied = self.conn.execute(
            "INSERT OR IGNORE INTO task_tags (task_id, tag)
             SELECT ?2, tag FROM task_tags WHERE task_id = ?1",
            params![from_id, to_id],
        )?;
        Ok(copied)
    }

    fn next_sort_order(&self, list_id: Option<&str>) -> Result<i64> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(sort_order) FROM tasks WHERE list_id IS ?1",
            params![list_id],
            |row| row.get(0),
        )?;
        Ok(max.map_or(0, |m| m + 1))
    }

    fn delete_task(&self, id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result = f(self).and_then(|value| {
            self.conn.execute_batch("COMMIT;")?;
            Ok(value)
        });
        if result.is_err() {
            // A failed COMMIT can leave the transaction open.
            if !self.conn.is_autocommit() {
                let _ = self.conn.execute_batch("ROLLBACK;");
            }
        }
        result
    }
}

impl ReminderStore for Database {
    fn get_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        let reminder = self
            .conn
            .query_row(
                &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1"),
                params![id],
                row_to_reminder,
            )
            .optional()?;
        Ok(reminder)
    }

    fn create_reminder(&self, reminder: &Reminder) -> Result<()> {
        check_storable(reminder)?;
        self.conn.execute(
            &format!("INSERT INTO reminders ({REMINDER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                reminder.id,
                reminder.task_id,
                format_instant(&reminder.reminder_time),
                reminder.triggered,
                reminder.snoozed_until.as_ref().map(format_instant),
                format_instant(&reminder.created_at),
            ],
        )?;
        Ok(())
    }

    fn update_reminder(&self, reminder: &Reminder) -> Result<bool> {
        check_storable(reminder)?;
        let changed = self.conn.execute(
            "UPDATE reminders
             SET reminder_time = ?2, triggered = ?3, snoozed_until = ?4
             WHERE id = ?1",
            params![
                reminder.id,
                format_instant(&reminder.reminder_time),
                reminder.triggered,
                reminder.snoozed_until.as_ref().map(format_instant),
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_reminder(&self, id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn mark_triggered(&self, id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE reminders SET triggered = 1 WHERE id = ?1 AND triggered = 0",
            params![id],
        )?;
        Ok(changed > 0)
    }

    fn pending_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        self.query_reminders(
            &format!(
                "SELECT {REMINDER_COLUMNS} FROM reminders
                 WHERE triggered = 0 AND (snoozed_until IS NULL OR snoozed_until <= ?1)
                 ORDER BY reminder_time ASC"
            ),
            params![format_instant(&now)],
        )
    }

    fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let now = format_instant(&now);
        self.query_reminders(
            &format!(
                "SELECT {REMINDER_COLUMNS} FROM reminders
                 WHERE triggered = 0
                   AND reminder_time <= ?1
                   AND (snoozed_until IS NULL OR snoozed_until <= ?1)
                 ORDER BY reminder_time ASC"
            ),
            params![now],
        )
    }

    fn reminders_for_task(&self, task_id: &str) -> Result<Vec<Reminder>> {
        self.query_reminders(
            &format!(
                "SELECT {REMINDER_COLUMNS} FROM reminders WHERE task_id = ?1 ORDER BY reminder_time ASC"
            ),
            params![task_id],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::task::{Priority, RecurrencePattern, RegenerateMode};
    use chrono::{Duration, TimeZone};

    fn instant(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn make_test_task() -> Task {
        let mut task = Task::new("Test task");
        task.description = Some("A test task".to_string());
        task.list_id = Some("inbox".to_string());
        task.due_date = NaiveDate::from_ymd_opt(2024, 3, 4);
        task.due_time = NaiveTime::from_hms_opt(9, 15, 0);
        task.priority = Priority::High;
        task.tags = vec!["home".to_string(), "weekly".to_string()];
        task.recurrence = RecurrenceRule::every(RecurrencePattern::Weekly, 2)
            .with_weekdays([1, 5])
            .until(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .mode(RegenerateMode::OnCompletion);
        task.created_at = instant(0);
        task.updated_at = instant(0);
        task
    }

    #[test]
    fn create_and_get_task() {
        let db = Database::open_memory().unwrap();
        let task = make_test_task();
        db.create_task(&task).unwrap();

        let retrieved = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(retrieved, task);
    }

    #[test]
    fn get_missing_task_is_none() {
        let db = Database::open_memory().unwrap();
        assert!(db.get_task("nope").unwrap().is_none());
    }

    #[test]
    fn update_task_persists_completion() {
        let db = Database::open_memory().unwrap();
        let mut task = make_test_task();
        db.create_task(&task).unwrap();

        task.complete(instant(60));
        assert!(db.update_task(&task).unwrap());

        let retrieved = db.get_task(&task.id).unwrap().unwrap();
        assert!(retrieved.completed);
        assert_eq!(retrieved.completed_at, Some(instant(60)));
        assert_eq!(retrieved.tags, task.tags);
    }

    #[test]
    fn update_missing_task_reports_false() {
        let db = Database::open_memory().unwrap();
        assert!(!db.update_task(&make_test_task()).unwrap());
    }

    #[test]
    fn copy_tags_leaves_source_intact() {
        let db = Database::open_memory().unwrap();
        let source = make_test_task();
        let mut target = make_test_task();
        target.id = "target".to_string();
        target.tags = vec![];
        db.create_task(&source).unwrap();
        db.create_task(&target).unwrap();

        assert_eq!(db.copy_tags(&source.id, &target.id).unwrap(), 2);
        assert_eq!(db.get_task(&target.id).unwrap().unwrap().tags, source.tags);
        assert_eq!(db.get_task(&source.id).unwrap().unwrap().tags, source.tags);
    }

    #[test]
    fn next_sort_order_appends_per_list() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.next_sort_order(Some("inbox")).unwrap(), 0);

        let mut task = make_test_task();
        task.sort_order = 4;
        db.create_task(&task).unwrap();
        assert_eq!(db.next_sort_order(Some("inbox")).unwrap(), 5);
        assert_eq!(db.next_sort_order(Some("work")).unwrap(), 0);
        assert_eq!(db.next_sort_order(None).unwrap(), 0);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let db = Database::open_memory().unwrap();
        let task = make_test_task();
        let result: Result<()> = db.in_transaction(|db| {
            db.create_task(&task)?;
            Err(DatabaseError::QueryFailed("boom".into()).into())
        });
        assert!(result.is_err());
        assert!(db.get_task(&task.id).unwrap().is_none());
    }

    #[test]
    fn deleting_task_cascades_to_reminders_and_tags() {
        let db = Database::open_memory().unwrap();
        let task = make_test_task();
        db.create_task(&task).unwrap();
        let reminder = Reminder::new(&task.id, instant(100));
        db.create_reminder(&reminder).unwrap();

        assert!(db.delete_task(&task.id).unwrap());
        assert!(db.get_reminder(&reminder.id).unwrap().is_none());
        let tag_rows: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM task_tags", [], |row| row.get(0))
            .unwrap();
        assert_eq!(tag_rows, 0);
    }

    #[test]
    fn reminder_requires_existing_task() {
        let db = Database::open_memory().unwrap();
        let reminder = Reminder::new("missing-task", instant(0));
        assert!(db.create_reminder(&reminder).is_err());
    }

    #[test]
    fn mark_triggered_only_wins_once() {
        let db = Database::open_memory().unwrap();
        let task = make_test_task();
        db.create_task(&task).unwrap();
        let reminder = Reminder::new(&task.id, instant(0));
        db.create_reminder(&reminder).unwrap();

        assert!(db.mark_triggered(&reminder.id).unwrap());
        assert!(!db.mark_triggered(&reminder.id).unwrap());
        assert!(db.get_reminder(&reminder.id).unwrap().unwrap().triggered);
    }

    #[test]
    fn pending_and_due_queries_respect_snooze() {
        let db = Database::open_memory().unwrap();
        let task = make_test_task();
        db.create_task(&task).unwrap();
        let now = instant(1_000);

        let past = Reminder::new(&task.id, now - Duration::minutes(1));
        let future = Reminder::new(&task.id, now + Duration::minutes(1));
        let mut snoozed = Reminder::new(&task.id, now);
        snoozed.snooze(now, 5).unwrap();
        let mut fired = Reminder::new(&task.id, now - Duration::minutes(2));
        fired.triggered = true;
        for r in [&past, &future, &snoozed, &fired] {
            db.create_reminder(r).unwrap();
        }

        let pending: Vec<String> = db.pending_reminders(now).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(pending, vec![past.id.clone(), future.id.clone()]);

        let due: Vec<String> = db.due_reminders(now).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(due, vec![past.id.clone()]);

        let later = now + Duration::minutes(5);
        let due_later: Vec<String> = db.due_reminders(later).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(due_later, vec![past.id, future.id, snoozed.id]);
    }

    #[test]
    fn reminder_round_trip_keeps_millisecond_precision() {
        let db = Database::open_memory().unwrap();
        let task = make_test_task();
        db.create_task(&task).unwrap();
        let at = instant(5) + Duration::milliseconds(250);
        let mut reminder = Reminder::new(&task.id, at);
        reminder.created_at = instant(0);
        db.create_reminder(&reminder).unwrap();

        assert_eq!(db.get_reminder(&reminder.id).unwrap().unwrap(), reminder);
    }

    #[test]
    fn undecodable_reminder_rows_are_skipped() {
        let db = Database::open_memory().unwrap();
        let task = make_test_task();
        db.create_task(&task).unwrap();
        let now = instant(1_000);
        let good = Reminder::new(&task.id, now - Duration::minutes(1));
        db.create_reminder(&good).unwrap();
        for (id, at) in [("far-future", "+10192-12-03T00:00:00.000Z"), ("garbage", "0000-not-a-date")] {
            db.conn()
                .execute(
                    "INSERT INTO reminders (id, task_id, reminder_time, triggered, created_at)
                     VALUES (?1, ?2, ?3, 0, ?4)",
                    params![id, task.id, at, format_instant(&now)],
                )
                .unwrap();
        }

        let due: Vec<String> = db.due_reminders(now).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(due, vec![good.id.clone()]);
        assert_eq!(db.pending_reminders(now).unwrap().len(), 1);
        assert_eq!(db.list_reminders().unwrap().len(), 1);
    }

    #[test]
    fn out_of_range_reminder_is_not_stored() {
        let db = Database::open_memory().unwrap();
        let task = make_test_task();
        db.create_task(&task).unwrap();
        let far = Utc.with_ymd_and_hms(10192, 12, 3, 0, 0, 0).unwrap();
        let err = db.create_reminder(&Reminder::new(&task.id, far)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let mut reminder = Reminder::new(&task.id, instant(0));
        db.create_reminder(&reminder).unwrap();
        reminder.snoozed_until = Some(far);
        assert!(db.update_reminder(&reminder).is_err());
        assert_eq!(db.get_reminder(&reminder.id).unwrap().unwrap().snoozed_until, None);
    }

    #[test]
    fn failed_commit_rolls_back() {
        let db = Database::open_memory().unwrap();
        let result = db.in_transaction(|db| {
            db.conn().execute_batch("PRAGMA defer_foreign_keys = ON;")?;
            // No such task; the foreign key check fires at COMMIT.
            db.create_reminder(&Reminder::new("ghost", instant(0)))
        });
        assert!(result.is_err());
        assert!(db.conn().is_autocommit());
        assert!(db.list_reminders().unwrap().is_empty());

        let task = make_test_task();
        db.in_transaction(|db| db.create_task(&task)).unwrap();
        assert!(db.get_task(&task.id).unwrap().is_some());
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadence.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.create_task(&make_test_task()).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.list_tasks().unwrap().len(), 1);
    }
}
