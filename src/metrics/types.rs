use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::query::range::{DateRange, GroupBy};
use crate::score::PerformanceStatus;

/// Dashboard cards for a manager's team.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub manager_id: String,
    pub total_team_hours: Decimal,
    pub average_hours_per_member: Decimal,
    /// Percentage of tasks created by the manager in range that are done.
    pub completion_rate: Decimal,
    pub completed_tasks_count: u64,
    pub total_tasks_count: u64,
    pub team_member_count: u64,
    pub calculated_from: NaiveDate,
    pub calculated_to: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendDataPoint {
    /// First day of the bucket.
    pub date: NaiveDate,
    pub label: String,
    pub total_hours: Decimal,
    pub tasks_completed: u64,
    pub active_members: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamHoursTrend {
    pub manager_id: String,
    pub group_by: GroupBy,
    pub range: DateRange,
    pub trend_data: Vec<TrendDataPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPerformance {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub total_hours: Decimal,
    pub tasks_assigned: u64,
    pub tasks_completed: u64,
    pub tasks_in_progress: u64,
    pub tasks_pending: u64,
    pub efficiency_score: Decimal,
    pub performance_status: PerformanceStatus,
    /// Mean logged hours per completed task.
    pub average_task_completion_time: Decimal,
    pub overdue_tasks_count: u64,
}

/// Members ordered by efficiency score, highest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPerformance {
    pub manager_id: String,
    pub range: DateRange,
    pub members: Vec<MemberPerformance>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletionBreakdown {
    pub completed_count: u64,
    pub in_progress_count: u64,
    pub pending_count: u64,
    pub rejected_count: u64,
    pub overdue_count: u64,
    pub total_count: u64,
    pub completion_percentage: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerDashboardStats {
    pub manager_id: String,
    pub team_member_count: u64,
    /// Team tasks still pending or in progress.
    pub active_tasks: u64,
    pub team_hours_today: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentAnalytics {
    pub department_name: String,
    pub employee_count: u64,
    pub total_hours: Decimal,
    pub avg_hours_per_employee: Decimal,
    pub completed_tasks: u64,
    pub in_progress_tasks: u64,
    pub pending_tasks: u64,
    pub employee_ids: Vec<String>,
}

/// One day of an hours chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHours {
    pub date: NaiveDate,
    pub total_hours: Decimal,
    pub active_employees: u64,
    pub date_label: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub total_hours_logged: Decimal,
    pub avg_hours_per_employee: Decimal,
    /// Users still clocked in today. Approximate: ignores shifts that cross midnight.
    pub active_employees: u64,
    pub total_employees: u64,

    pub completed_tasks: u64,
    pub in_progress_tasks: u64,
    pub pending_tasks: u64,
    pub task_completion_percentage: Decimal,

    pub employee_count: u64,
    pub manager_count: u64,
    pub admin_count: u64,

    pub department_metrics: Vec<DepartmentAnalytics>,
    pub avg_employees_per_department: Decimal,

    pub hours_trend_data: Vec<DailyHours>,

    pub range: DateRange,
    pub report_generated_at: DateTime<Utc>,
    pub period_range: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDistribution {
    pub completed: u64,
    pub in_progress: u64,
    pub pending: u64,
}

/// Trailing-week productivity for one user. Served from the result cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivitySnapshot {
    pub user_id: String,
    pub total_hours_logged: Decimal,
    pub task_completion_rate: Decimal,
    pub efficiency_score: Decimal,
    pub completed_tasks: u64,
    pub total_tasks: u64,
    pub in_progress_tasks: u64,
    pub pending_tasks: u64,
    /// Mean over the days that have logged hours.
    pub weekly_average: Decimal,
    /// Oldest first; the last value is today.
    pub daily_hours: Vec<Decimal>,
    pub task_distribution: TaskDistribution,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportScope {
    User,
    Department,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityReport {
    pub scope: ReportScope,
    pub subject: String,
    pub range: DateRange,
    pub member_count: u64,
    pub total_hours: Decimal,
    /// Hours logged against tasks.
    pub task_hours: Decimal,
    pub focus_percentage: Decimal,
    pub tasks_assigned: u64,
    pub tasks_completed: u64,
    pub completion_rate: Decimal,
    pub productivity_score: Decimal,
    pub performance_status: PerformanceStatus,
    pub daily_hours: Vec<DailyHours>,
}
