//! The read capability the aggregation engine needs from the record store.
//!
//! Every per-member read is batched over a set of ids so the implementation
//! decides the fetch strategy. The engine never writes.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::query::range::DateRange;
use crate::records::{Role, Task, TaskStatus, TimeEntry, User};

/// Filter for [`RecordStore::tasks_filtered`]. The range applies to the
/// task's creation date; the department to its assignee, who must be active.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub range: Option<DateRange>,
    pub status: Option<TaskStatus>,
    pub department: Option<String>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    // ── Time entries ───────────────────────────────────────────────

    async fn time_entries_for_owners(
        &self,
        owner_ids: &[String],
        range: DateRange,
    ) -> Result<Vec<TimeEntry>>;

    /// Entries of the department's active members.
    async fn time_entries_for_department(
        &self,
        department: &str,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>>;

    async fn time_entries_in_range(&self, range: DateRange) -> Result<Vec<TimeEntry>>;

    /// Owners with no entries in range are absent from the map.
    async fn total_hours_by_owner(
        &self,
        owner_ids: &[String],
        range: DateRange,
    ) -> Result<HashMap<String, Decimal>>;

    async fn total_hours_for_owners_on(
        &self,
        owner_ids: &[String],
        date: NaiveDate,
    ) -> Result<Decimal>;

    async fn entry_for_owner_on(&self, owner_id: &str, date: NaiveDate)
        -> Result<Option<TimeEntry>>;

    // ── Task time ──────────────────────────────────────────────────

    /// Accumulated hours per task; tasks with no logged time are absent.
    async fn task_hours(&self, task_ids: &[String]) -> Result<HashMap<String, Decimal>>;

    /// Hours logged against any task by the given owners within range.
    async fn task_hours_for_owners(
        &self,
        owner_ids: &[String],
        range: DateRange,
    ) -> Result<Decimal>;

    // ── Tasks ──────────────────────────────────────────────────────

    async fn tasks_by_assignees(&self, assignee_ids: &[String]) -> Result<Vec<Task>>;

    async fn tasks_by_creator(&self, creator_id: &str) -> Result<Vec<Task>>;

    /// Tasks in any of `statuses` created within range.
    async fn tasks_with_status_in_range(
        &self,
        statuses: &[TaskStatus],
        range: DateRange,
    ) -> Result<Vec<Task>>;

    async fn tasks_filtered(&self, filter: &TaskFilter) -> Result<Vec<Task>>;

    // ── Users and membership ───────────────────────────────────────

    async fn employees_of(&self, manager_id: &str) -> Result<Vec<User>>;

    async fn employee_count_of(&self, manager_id: &str) -> Result<u64>;

    async fn users_by_role(&self, role: Role) -> Result<Vec<User>>;

    async fn users_by_department(&self, department: &str) -> Result<Vec<User>>;

    async fn departments(&self) -> Result<Vec<String>>;

    async fn active_users(&self) -> Result<Vec<User>>;

    /// Active users whose entry for `date` has no end time yet.
    async fn clocked_in_users(&self, date: NaiveDate) -> Result<Vec<User>>;
}
