//! Database schema migrations for cadence.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Schema version written by the newest migration.
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version; 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| row.get::<_, i32>(0)) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: tasks with recurrence columns, plus the tag association.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id                   TEXT PRIMARY KEY,
            title                TEXT NOT NULL,
            description          TEXT,
            notes                TEXT,
            list_id              TEXT,
            due_date             TEXT,
            due_time             TEXT,
            priority             TEXT NOT NULL DEFAULT 'none',
            completed            INTEGER NOT NULL DEFAULT 0,
            completed_at         TEXT,
            sort_order           INTEGER NOT NULL DEFAULT 0,
            recurrence_pattern   TEXT NOT NULL DEFAULT 'none',
            recurrence_interval  INTEGER NOT NULL DEFAULT 1,
            recurrence_weekdays  TEXT NOT NULL DEFAULT '[]',
            recurrence_end_date  TEXT,
            regenerate_mode      TEXT NOT NULL DEFAULT 'fixed_schedule',
            created_at           TEXT NOT NULL,
            updated_at           TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS task_tags (
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            tag     TEXT NOT NULL,
            PRIMARY KEY (task_id, tag)
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_list_order ON tasks(list_id, sort_order);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: reminders attached to tasks.
///
/// Instants are stored as fixed-width RFC 3339 UTC text, so the pending/due
/// range queries can compare them as strings.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS reminders (
            id             TEXT PRIMARY KEY,
            task_id        TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            reminder_time  TEXT NOT NULL,
            triggered      INTEGER NOT NULL DEFAULT 0,
            snoozed_until  TEXT,
            created_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_reminders_pending ON reminders(triggered, reminder_time);
        CREATE INDEX IF NOT EXISTS idx_reminders_task ON reminders(task_id);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
