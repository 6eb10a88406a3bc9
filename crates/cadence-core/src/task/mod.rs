//! Task types as seen by the temporal subsystem.
//!
//! A task instance moves `Pending -> Completed` exactly once. A repeating
//! series continues through a freshly created instance, never by reopening
//! the completed one.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Cadence type governing how the next due date is derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    /// Not repeating (default)
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Every `interval` days, like daily but user-labelled as custom
    Custom,
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::None => "none",
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Yearly => "yearly",
            RecurrencePattern::Custom => "custom",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurrencePattern::None)
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrencePattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(RecurrencePattern::None),
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "yearly" => Ok(RecurrencePattern::Yearly),
            "custom" => Ok(RecurrencePattern::Custom),
            other => Err(ValidationError::InvalidValue {
                field: "recurrence_pattern".into(),
                message: format!("unknown pattern '{other}'"),
            }),
        }
    }
}

/// Whether a series advances from the previous due date or from the day
/// the previous instance was completed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegenerateMode {
    OnCompletion,
    #[default]
    FixedSchedule,
}

impl RegenerateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegenerateMode::OnCompletion => "on_completion",
            RegenerateMode::FixedSchedule => "fixed_schedule",
        }
    }
}

impl FromStr for RegenerateMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_completion" | "on-completion" => Ok(RegenerateMode::OnCompletion),
            "fixed_schedule" | "fixed-schedule" | "fixed" => Ok(RegenerateMode::FixedSchedule),
            other => Err(ValidationError::InvalidValue {
                field: "regenerate_mode".into(),
                message: format!("unknown mode '{other}'"),
            }),
        }
    }
}

/// Task priority. Only `High` changes reminder behavior (critical urgency).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Priority::None),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("unknown priority '{other}'"),
            }),
        }
    }
}

/// Recurrence configuration carried by a task.
///
/// When `pattern` is `None` every other field is inert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub pattern: RecurrencePattern,
    /// Step size in pattern units; values below 1 end the series.
    pub interval: u32,
    /// Weekdays, 0=Sunday .. 6=Saturday. Only consulted for weekly.
    #[serde(default, deserialize_with = "deserialize_weekdays")]
    pub weekdays: Vec<u8>,
    /// Last date an instance may fall on (inclusive).
    pub end_date: Option<NaiveDate>,
    pub regenerate_mode: RegenerateMode,
}

impl RecurrenceRule {
    pub fn none() -> Self {
        Self {
            pattern: RecurrencePattern::None,
            interval: 1,
            weekdays: Vec::new(),
            end_date: None,
            regenerate_mode: RegenerateMode::FixedSchedule,
        }
    }

    pub fn every(pattern: RecurrencePattern, interval: u32) -> Self {
        Self {
            pattern,
            interval,
            ..Self::none()
        }
    }

    pub fn with_weekdays(mut self, weekdays: impl IntoIterator<Item = u8>) -> Self {
        self.weekdays = normalize_weekdays(weekdays);
        self
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn mode(mut self, mode: RegenerateMode) -> Self {
        self.regenerate_mode = mode;
        self
    }
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self::none()
    }
}

/// Sort ascending, drop duplicates and anything outside 0..=6.
pub fn normalize_weekdays(weekdays: impl IntoIterator<Item = u8>) -> Vec<u8> {
    let mut days: Vec<u8> = weekdays.into_iter().filter(|d| *d <= 6).collect();
    days.sort_unstable();
    days.dedup();
    days
}

fn deserialize_weekdays<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Vec::<u8>::deserialize(deserializer).map(normalize_weekdays)
}

/// A task row, restricted to the fields the temporal subsystem reads or
/// writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// Owning list (None = inbox)
    pub list_id: Option<String>,
    /// Calendar due date; recurrence needs one as its anchor
    pub due_date: Option<NaiveDate>,
    /// Time of day, reused verbatim by every spawned instance
    pub due_time: Option<NaiveTime>,
    pub priority: Priority,
    pub completed: bool,
    /// Set iff `completed`
    pub completed_at: Option<DateTime<Utc>>,
    /// Position within the owning list
    pub sort_order: i64,
    /// Tag names (many-to-many association)
    #[serde(default)]
    pub tags: Vec<String>,
    pub recurrence: RecurrenceRule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending, non-repeating task.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            notes: None,
            list_id: None,
            due_date: None,
            due_time: None,
            priority: Priority::None,
            completed: false,
            completed_at: None,
            sort_order: 0,
            tags: Vec::new(),
            recurrence: RecurrenceRule::none(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.pattern.is_recurring()
    }

    /// Mark this instance completed. Returns false if it already was.
    pub fn complete(&mut self, at: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(at);
        self.updated_at = at;
        true
    }

    /// Build the next instance of this series, due on `due_date`.
    ///
    /// Tags are left empty: the store copies the association rows so the
    /// completed instance keeps its own set.
    pub fn spawn_next(&self, due_date: NaiveDate, now: DateTime<Utc>) -> Task {
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            notes: self.notes.clone(),
            list_id: self.list_id.clone(),
            due_date: Some(due_date),
            due_time: self.due_time,
            priority: self.priority,
            completed: false,
            completed_at: None,
            sort_order: 0,
            tags: Vec::new(),
            recurrence: self.recurrence.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}
