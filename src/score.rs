//! Scoring formulas. Pure functions over counts; no I/O.
//!
//! Nothing here rounds. Callers round once when building a metric document.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::records::{Task, TaskStatus};

const FOCUS_WEIGHT: Decimal = Decimal::from_parts(6, 0, 0, false, 1);
const COMPLETION_WEIGHT: Decimal = Decimal::from_parts(4, 0, 0, false, 1);

/// `part / whole * 100`, or zero when `whole` is zero.
fn percent_of(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part) / Decimal::from(whole) * Decimal::ONE_HUNDRED
}

pub fn completion_rate(total: u64, completed: u64) -> Decimal {
    percent_of(completed, total)
}

pub fn efficiency_score(assigned: u64, completed: u64) -> Decimal {
    percent_of(completed, assigned)
}

/// Mean of `total` over `count`, zero for an empty set.
pub fn average(total: Decimal, count: u64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

pub fn clamp_percentage(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

/// Output-boundary rounding: two fractional digits, banker's rounding.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceStatus {
    Excellent,
    Good,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
}

impl PerformanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceStatus::Excellent => "Excellent",
            PerformanceStatus::Good => "Good",
            PerformanceStatus::NeedsAttention => "Needs Attention",
        }
    }
}

impl std::fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Thresholds are inclusive lower bounds.
pub fn performance_status(efficiency: Decimal) -> PerformanceStatus {
    if efficiency >= Decimal::from(90) {
        PerformanceStatus::Excellent
    } else if efficiency >= Decimal::from(70) {
        PerformanceStatus::Good
    } else {
        PerformanceStatus::NeedsAttention
    }
}

/// Mean accumulated hours per completed task. Tasks with no logged time
/// count as zero hours.
pub fn average_completion_time<'a>(
    completed: impl IntoIterator<Item = &'a Task>,
    hours_by_task: &HashMap<String, Decimal>,
) -> Decimal {
    let mut total = Decimal::ZERO;
    let mut count = 0u64;
    for task in completed {
        total += hours_by_task.get(&task.id).copied().unwrap_or_default();
        count += 1;
    }
    average(total, count)
}

pub fn overdue_count<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> u64 {
    tasks.into_iter().filter(|t| t.is_overdue(now)).count() as u64
}

/// `focus% * 0.6 + completion% * 0.4`, clamped to [0, 100].
pub fn weighted_productivity_score(focus_pct: Decimal, completion_pct: Decimal) -> Decimal {
    clamp_percentage(
        clamp_percentage(focus_pct) * FOCUS_WEIGHT
            + clamp_percentage(completion_pct) * COMPLETION_WEIGHT,
    )
}

/// Status tally over a task set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub pending: u64,
    pub rejected: u64,
    pub overdue: u64,
}

impl StatusCounts {
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Self {
        let tasks: Vec<&Task> = tasks.into_iter().collect();
        let mut c = Self {
            overdue: overdue_count(tasks.iter().copied(), now),
            ..Self::default()
        };
        for t in tasks {
            c.total += 1;
            match t.status {
                TaskStatus::Completed | TaskStatus::Approved => c.completed += 1,
                TaskStatus::InProgress => c.in_progress += 1,
                TaskStatus::Pending => c.pending += 1,
            }
            if t.is_rejected {
                c.rejected += 1;
            }
        }
        c
    }

    pub fn completion_rate(&self) -> Decimal {
        completion_rate(self.total, self.completed)
    }

    /// Pending or in progress.
    pub fn active(&self) -> u64 {
        self.pending + self.in_progress
    }
}
