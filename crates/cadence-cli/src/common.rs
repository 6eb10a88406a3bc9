//! Helpers shared by the CLI commands.

use std::sync::{Arc, Mutex};

use cadence_core::{Config, Database, LogSink, NotificationSink, ReminderScheduler};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::sink::StdoutSink;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Scheduler for one-shot commands.
///
/// Stdout carries the command's JSON result, so anything delivered while
/// the command runs is only logged.
pub fn open_scheduler(config: &Config) -> CliResult<ReminderScheduler<Database>> {
    scheduler_with(config, Arc::new(LogSink))
}

/// Scheduler for `cadence run`, writing notifications to stdout when they
/// are enabled.
pub fn open_notifying_scheduler(config: &Config) -> CliResult<ReminderScheduler<Database>> {
    let sink: Arc<dyn NotificationSink> = if config.notifications.enabled {
        Arc::new(StdoutSink)
    } else {
        Arc::new(LogSink)
    };
    scheduler_with(config, sink)
}

fn scheduler_with(config: &Config, sink: Arc<dyn NotificationSink>) -> CliResult<ReminderScheduler<Database>> {
    let db = Database::open()?;
    Ok(ReminderScheduler::with_escalation(
        Arc::new(Mutex::new(db)),
        sink,
        config.notifications.high_priority_critical,
    ))
}

pub fn parse_date(value: &str) -> CliResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("invalid date '{value}': {e}").into())
}

pub fn parse_time(value: &str) -> CliResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| format!("invalid time '{value}': {e}").into())
}

/// RFC 3339 instant, e.g. `2024-03-10T09:00:00Z`.
pub fn parse_instant(value: &str) -> CliResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid instant '{value}': {e}").into())
}

/// Split a comma-separated list, trimming blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
