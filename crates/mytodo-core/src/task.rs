use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    MonthlyDate,
}

impl ReminderType {
    pub const ALL: &[ReminderType] = &[
        ReminderType::None,
        ReminderType::Daily,
        ReminderType::Weekly,
        ReminderType::Monthly,
        ReminderType::MonthlyDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderType::None => "none",
            ReminderType::Daily => "daily",
            ReminderType::Weekly => "weekly",
            ReminderType::Monthly => "monthly",
            ReminderType::MonthlyDate => "monthly_date",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ReminderType::None => "None",
            ReminderType::Daily => "Daily",
            ReminderType::Weekly => "Weekly",
            ReminderType::Monthly => "Monthly",
            ReminderType::MonthlyDate => "Monthly (date)",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(ReminderType::None),
            "daily" => Some(ReminderType::Daily),
            "weekly" => Some(ReminderType::Weekly),
            "monthly" => Some(ReminderType::Monthly),
            "monthly_date" => Some(ReminderType::MonthlyDate),
            _ => None,
        }
    }

    /// Column representation. `None` is stored as SQL NULL.
    pub fn to_column(self) -> Option<&'static str> {
        match self {
            ReminderType::None => None,
            other => Some(other.as_str()),
        }
    }

    pub fn from_column(value: Option<&str>) -> Self {
        value
            .and_then(ReminderType::parse_str)
            .unwrap_or(ReminderType::None)
    }

    /// Valid `reminder_day` values, for the types that use one.
    pub fn day_range(&self) -> Option<RangeInclusive<i64>> {
        match self {
            ReminderType::Weekly => Some(0..=6),
            ReminderType::MonthlyDate => Some(1..=31),
            _ => None,
        }
    }
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Check `reminder_day` against `reminder_type` and return the value to store.
///
/// Types without a day drop whatever was supplied.
pub fn normalize_reminder(
    kind: ReminderType,
    day: Option<i64>,
) -> Result<Option<i64>, ValidationError> {
    match kind.day_range() {
        None => Ok(None),
        Some(range) => match day {
            Some(d) if range.contains(&d) => Ok(Some(d)),
            _ => Err(ValidationError::ReminderDay {
                kind: kind.as_str(),
                min: *range.start(),
                max: *range.end(),
            }),
        },
    }
}

/// Where a task sits in its lifecycle. Purged tasks have no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Active,
    Completed,
    Trashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub section_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub is_important: bool,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder_type: ReminderType,
    pub reminder_day: Option<i64>,
    pub last_reminded_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub section_icon: Option<String>,
    #[serde(default)]
    pub attachment_count: i64,
}

impl Task {
    pub fn state(&self) -> TaskState {
        if self.is_deleted {
            TaskState::Trashed
        } else if self.is_completed {
            TaskState::Completed
        } else {
            TaskState::Active
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_deleted && !self.is_completed && self.due_date.is_some_and(|d| d < today)
    }

    /// A reminder is due when one is configured and it has not fired today.
    pub fn reminder_due(&self, today: NaiveDate) -> bool {
        !self.is_deleted
            && !self.is_completed
            && self.reminder_type != ReminderType::None
            && self.last_reminded_on.map_or(true, |d| d < today)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section_id: Option<i64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reminder_type: ReminderType,
    #[serde(default)]
    pub reminder_day: Option<i64>,
}

impl CreateTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Partial update. Only the fields present in the request are written.
///
/// Nullable columns use `Option<Option<T>>`: absent leaves the column alone,
/// `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub section_id: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_important: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present_or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder_type: Option<ReminderType>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder_day: Option<Option<i64>>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        *self == UpdateTask::default()
    }

    pub fn completed(done: bool) -> Self {
        Self {
            is_completed: Some(done),
            ..Default::default()
        }
    }
}

/// Present field (even `null`) becomes `Some`; a missing field stays `None`
/// through `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn present_or_default<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
