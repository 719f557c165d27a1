//! Input records read from the record store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            other => Err(Error::Validation(format!("unknown role: {other}"))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a task. `Approved` scores the same as `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Approved,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Approved => "Approved",
        }
    }

    /// Completed and Approved are terminal; neither can become overdue.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Approved)
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    /// Lenient parse: case-insensitive, ignores spaces and hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "inprogress" => Ok(TaskStatus::InProgress),
            "completed" | "complete" => Ok(TaskStatus::Completed),
            "approved" => Ok(TaskStatus::Approved),
            _ => Err(Error::Validation(format!("unknown task status: {s}"))),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub department: Option<String>,
    /// Membership edge: the manager this user reports to.
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// One attendance record per owner per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub owner_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub break_minutes: i32,
    pub total_hours: Decimal,
    #[serde(default)]
    pub activity: Option<String>,
}

impl TimeEntry {
    /// No end-of-day offset recorded yet.
    pub fn is_clocked_in(&self) -> bool {
        self.end_time.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub assignee_id: String,
    pub creator_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_rejected: bool,
}

impl Task {
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn completed_on(&self) -> Option<NaiveDate> {
        self.completed_at.map(|c| c.date_naive())
    }

    /// Due strictly before `now` and not in a terminal state.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.due_at.is_some_and(|due| due < now)
    }
}

/// Hours logged against a specific task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTimeEntry {
    pub task_id: String,
    pub owner_id: String,
    pub date: NaiveDate,
    pub hours: Decimal,
}
