//! Aggregation engine: reads from a [`RecordStore`], hands the fetched
//! collections to the trend bucketer and score calculator, and rounds once
//! when building each metric document.
//!
//! Unknown managers, users and departments produce zero-valued documents.

pub mod types;

pub use types::*;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::date_util::{date_label, range_label};
use crate::error::Result;
use crate::query::range::{DateRange, GroupBy, Lookback};
use crate::records::{Role, Task, TaskStatus, TimeEntry};
use crate::score::{
    self, average, average_completion_time, clamp_percentage, efficiency_score,
    performance_status, round2, weighted_productivity_score, StatusCounts,
};
use crate::store::{RecordStore, TaskFilter};
use crate::trend::{bucketize, Sample};

const SNAPSHOT_DAYS: u32 = 7;

fn created_within<'a>(tasks: &'a [Task], range: &'a DateRange) -> impl Iterator<Item = &'a Task> {
    tasks.iter().filter(move |t| range.contains(t.created_on()))
}

fn ids_of(users: &[crate::records::User]) -> Vec<String> {
    users.iter().map(|u| u.id.clone()).collect()
}

/// Daily buckets over `range`, one per calendar day.
fn daily_series(entries: &[TimeEntry], range: DateRange) -> Vec<DailyHours> {
    let samples: Vec<Sample> = entries.iter().map(Sample::from).collect();
    bucketize(&samples, &[], GroupBy::Day, Some(range))
        .into_iter()
        .map(|b| DailyHours {
            date: b.start,
            total_hours: round2(b.total),
            active_employees: b.distinct_entities,
            date_label: date_label(b.start),
        })
        .collect()
}

// ── Team views ─────────────────────────────────────────────────────

pub async fn team_summary(
    store: &dyn RecordStore,
    manager_id: &str,
    range: DateRange,
    now: DateTime<Utc>,
) -> Result<TeamSummary> {
    let members = store.employees_of(manager_id).await?;
    let member_ids = ids_of(&members);

    let hours = store.total_hours_by_owner(&member_ids, range).await?;
    let total_team_hours: Decimal = member_ids
        .iter()
        .map(|id| hours.get(id).copied().unwrap_or_default())
        .sum();

    let created = store.tasks_by_creator(manager_id).await?;
    let counts = StatusCounts::tally(created_within(&created, &range), now);

    log::debug!(
        "team summary for {manager_id}: {} members, {} tasks",
        member_ids.len(),
        counts.total
    );

    Ok(TeamSummary {
        manager_id: manager_id.to_string(),
        total_team_hours: round2(total_team_hours),
        average_hours_per_member: round2(average(total_team_hours, member_ids.len() as u64)),
        completion_rate: round2(counts.completion_rate()),
        completed_tasks_count: counts.completed,
        total_tasks_count: counts.total,
        team_member_count: member_ids.len() as u64,
        calculated_from: range.start,
        calculated_to: range.end,
    })
}

/// Hours per day or week for the manager's team, with the number of tasks
/// created by the manager that were completed in each bucket.
pub async fn team_hours_trend(
    store: &dyn RecordStore,
    manager_id: &str,
    range: DateRange,
    group_by: GroupBy,
) -> Result<TeamHoursTrend> {
    let members = store.employees_of(manager_id).await?;
    let entries = store
        .time_entries_for_owners(&ids_of(&members), range)
        .await?;
    let samples: Vec<Sample> = entries.iter().map(Sample::from).collect();

    let completions: Vec<_> = store
        .tasks_by_creator(manager_id)
        .await?
        .iter()
        .filter_map(Task::completed_on)
        .collect();

    let trend_data = bucketize(&samples, &completions, group_by, Some(range))
        .into_iter()
        .map(|b| TrendDataPoint {
            date: b.start,
            label: date_label(b.start),
            total_hours: round2(b.total),
            tasks_completed: b.correlated_count,
            active_members: b.distinct_entities,
        })
        .collect();

    Ok(TeamHoursTrend {
        manager_id: manager_id.to_string(),
        group_by,
        range,
        trend_data,
    })
}

pub async fn team_member_performance(
    store: &dyn RecordStore,
    manager_id: &str,
    range: DateRange,
    now: DateTime<Utc>,
) -> Result<TeamMemberPerformance> {
    let members = store.employees_of(manager_id).await?;
    let member_ids = ids_of(&members);

    let hours = store.total_hours_by_owner(&member_ids, range).await?;

    let mut by_assignee: HashMap<String, Vec<Task>> = HashMap::new();
    for task in store.tasks_by_assignees(&member_ids).await? {
        if range.contains(task.created_on()) {
            by_assignee.entry(task.assignee_id.clone()).or_default().push(task);
        }
    }

    let completed_ids: Vec<String> = by_assignee
        .values()
        .flatten()
        .filter(|t| t.status.is_terminal())
        .map(|t| t.id.clone())
        .collect();
    let task_hours = store.task_hours(&completed_ids).await?;

    let mut performances = Vec::with_capacity(members.len());
    for member in &members {
        let tasks = by_assignee.get(&member.id).map(Vec::as_slice).unwrap_or(&[]);
        let counts = StatusCounts::tally(tasks, now);
        let efficiency = efficiency_score(counts.total, counts.completed);
        let avg_completion = average_completion_time(
            tasks.iter().filter(|t| t.status.is_terminal()),
            &task_hours,
        );

        performances.push(MemberPerformance {
            user_id: member.id.clone(),
            name: member.name.clone(),
            email: member.email.clone(),
            total_hours: round2(hours.get(&member.id).copied().unwrap_or_default()),
            tasks_assigned: counts.total,
            tasks_completed: counts.completed,
            tasks_in_progress: counts.in_progress,
            tasks_pending: counts.pending,
            efficiency_score: round2(efficiency),
            performance_status: performance_status(efficiency),
            average_task_completion_time: round2(avg_completion),
            overdue_tasks_count: counts.overdue,
        });
    }

    // Stable: ties keep membership order
    performances.sort_by(|a, b| b.efficiency_score.cmp(&a.efficiency_score));

    Ok(TeamMemberPerformance {
        manager_id: manager_id.to_string(),
        range,
        members: performances,
    })
}

pub async fn task_completion_breakdown(
    store: &dyn RecordStore,
    manager_id: &str,
    range: DateRange,
    now: DateTime<Utc>,
) -> Result<TaskCompletionBreakdown> {
    let created = store.tasks_by_creator(manager_id).await?;
    let counts = StatusCounts::tally(created_within(&created, &range), now);

    Ok(TaskCompletionBreakdown {
        completed_count: counts.completed,
        in_progress_count: counts.in_progress,
        pending_count: counts.pending,
        rejected_count: counts.rejected,
        overdue_count: counts.overdue,
        total_count: counts.total,
        completion_percentage: round2(counts.completion_rate()),
    })
}

pub async fn manager_dashboard_stats(
    store: &dyn RecordStore,
    manager_id: &str,
    now: DateTime<Utc>,
) -> Result<ManagerDashboardStats> {
    let team_member_count = store.employee_count_of(manager_id).await?;
    let member_ids = ids_of(&store.employees_of(manager_id).await?);

    let tasks = store.tasks_by_assignees(&member_ids).await?;
    let counts = StatusCounts::tally(&tasks, now);

    let today = store
        .total_hours_for_owners_on(&member_ids, now.date_naive())
        .await?;

    Ok(ManagerDashboardStats {
        manager_id: manager_id.to_string(),
        team_member_count,
        active_tasks: counts.active(),
        team_hours_today: round2(today),
    })
}

// ── Organization views ─────────────────────────────────────────────

pub async fn department_analytics(
    store: &dyn RecordStore,
    department: &str,
    range: DateRange,
    now: DateTime<Utc>,
) -> Result<DepartmentAnalytics> {
    let members = store.users_by_department(department).await?;
    let member_ids = ids_of(&members);

    let hours = store.total_hours_by_owner(&member_ids, range).await?;
    let total_hours: Decimal = member_ids
        .iter()
        .map(|id| hours.get(id).copied().unwrap_or_default())
        .sum();

    let filter = TaskFilter {
        range: Some(range),
        status: None,
        department: Some(department.to_string()),
    };
    let tasks = store.tasks_filtered(&filter).await?;
    let counts = StatusCounts::tally(&tasks, now);

    Ok(DepartmentAnalytics {
        department_name: department.to_string(),
        employee_count: member_ids.len() as u64,
        total_hours: round2(total_hours),
        avg_hours_per_employee: round2(average(total_hours, member_ids.len() as u64)),
        completed_tasks: counts.completed,
        in_progress_tasks: counts.in_progress,
        pending_tasks: counts.pending,
        employee_ids: member_ids,
    })
}

/// Organization hours for each of the last `period` days, today included.
pub async fn hours_trend(
    store: &dyn RecordStore,
    period: Lookback,
    now: DateTime<Utc>,
) -> Result<Vec<DailyHours>> {
    let range = DateRange::last_n_days(period.days(), now.date_naive());
    let entries = store.time_entries_in_range(range).await?;
    Ok(daily_series(&entries, range))
}

/// Organization-wide dashboard. `period`, when given, has already been
/// folded into `range` by the caller; here it only selects the trend length
/// and the range label.
pub async fn organization_summary(
    store: &dyn RecordStore,
    range: DateRange,
    period: Option<Lookback>,
    now: DateTime<Utc>,
) -> Result<OrganizationSummary> {
    let total_employees = store.active_users().await?.len() as u64;
    let employee_count = store.users_by_role(Role::Employee).await?.len() as u64;
    let manager_count = store.users_by_role(Role::Manager).await?.len() as u64;
    let admin_count = store.users_by_role(Role::Admin).await?.len() as u64;

    let total_hours: Decimal = store
        .time_entries_in_range(range)
        .await?
        .iter()
        .map(|e| e.total_hours)
        .sum();

    let active_employees = store.clocked_in_users(now.date_naive()).await?.len() as u64;

    let tasks = store
        .tasks_with_status_in_range(
            &[TaskStatus::Completed, TaskStatus::Approved, TaskStatus::InProgress, TaskStatus::Pending],
            range,
        )
        .await?;
    let counts = StatusCounts::tally(&tasks, now);

    let departments = store.departments().await?;
    let mut department_metrics = Vec::with_capacity(departments.len());
    for dept in &departments {
        department_metrics.push(department_analytics(store, dept, range, now).await?);
    }

    let hours_trend_data = hours_trend(store, period.unwrap_or(Lookback::Days7), now).await?;

    let period_range = match period {
        Some(p) => format!("Last {} days", p.days()),
        None => range_label(range.start, range.end),
    };

    log::debug!(
        "organization summary: {total_employees} employees, {} departments, {} tasks",
        departments.len(),
        counts.total
    );

    Ok(OrganizationSummary {
        total_hours_logged: round2(total_hours),
        avg_hours_per_employee: round2(average(total_hours, total_employees)),
        active_employees,
        total_employees,
        completed_tasks: counts.completed,
        in_progress_tasks: counts.in_progress,
        pending_tasks: counts.pending,
        task_completion_percentage: round2(counts.completion_rate()),
        employee_count,
        manager_count,
        admin_count,
        department_metrics,
        avg_employees_per_department: round2(average(
            Decimal::from(total_employees),
            departments.len() as u64,
        )),
        hours_trend_data,
        range,
        report_generated_at: now,
        period_range,
    })
}

// ── Individual productivity ────────────────────────────────────────

/// Trailing seven days (today included) of hours plus the status mix of
/// every task assigned to the user.
pub async fn productivity_snapshot(
    store: &dyn RecordStore,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<ProductivitySnapshot> {
    let owner = [user_id.to_string()];
    let range = DateRange::last_n_days(SNAPSHOT_DAYS, now.date_naive());

    let entries = store.time_entries_for_owners(&owner, range).await?;
    let days = daily_series(&entries, range);
    let daily_hours: Vec<Decimal> = days.iter().map(|d| d.total_hours).collect();
    let total: Decimal = entries.iter().map(|e| e.total_hours).sum();
    let days_with_logs = days.iter().filter(|d| d.total_hours > Decimal::ZERO).count() as u64;

    let tasks = store.tasks_by_assignees(&owner).await?;
    let counts = StatusCounts::tally(&tasks, now);
    let efficiency = clamp_percentage(efficiency_score(
        counts.total,
        counts.completed + counts.in_progress,
    ));

    Ok(ProductivitySnapshot {
        user_id: user_id.to_string(),
        total_hours_logged: round2(total),
        task_completion_rate: round2(clamp_percentage(counts.completion_rate())),
        efficiency_score: round2(efficiency),
        completed_tasks: counts.completed,
        total_tasks: counts.total,
        in_progress_tasks: counts.in_progress,
        pending_tasks: counts.pending,
        weekly_average: round2(average(total, days_with_logs)),
        daily_hours,
        task_distribution: TaskDistribution {
            completed: counts.completed,
            in_progress: counts.in_progress,
            pending: counts.pending,
        },
        generated_at: now,
    })
}

struct ReportInputs {
    member_count: u64,
    entries: Vec<TimeEntry>,
    task_hours: Decimal,
    tasks: Vec<Task>,
}

fn build_report(
    scope: ReportScope,
    subject: &str,
    range: DateRange,
    inputs: ReportInputs,
    now: DateTime<Utc>,
) -> ProductivityReport {
    let total_hours: Decimal = inputs.entries.iter().map(|e| e.total_hours).sum();
    let focus = clamp_percentage(if total_hours.is_zero() {
        Decimal::ZERO
    } else {
        inputs.task_hours / total_hours * Decimal::ONE_HUNDRED
    });
    let counts = StatusCounts::tally(&inputs.tasks, now);
    let completion = counts.completion_rate();
    let productivity = weighted_productivity_score(focus, completion);

    ProductivityReport {
        scope,
        subject: subject.to_string(),
        range,
        member_count: inputs.member_count,
        total_hours: round2(total_hours),
        task_hours: round2(inputs.task_hours),
        focus_percentage: round2(focus),
        tasks_assigned: counts.total,
        tasks_completed: counts.completed,
        completion_rate: round2(completion),
        productivity_score: round2(productivity),
        performance_status: score::performance_status(productivity),
        daily_hours: daily_series(&inputs.entries, range),
    }
}

pub async fn user_report(
    store: &dyn RecordStore,
    user_id: &str,
    range: DateRange,
    now: DateTime<Utc>,
) -> Result<ProductivityReport> {
    let owner = [user_id.to_string()];
    let entries = store.time_entries_for_owners(&owner, range).await?;
    let task_hours = store.task_hours_for_owners(&owner, range).await?;
    let tasks: Vec<Task> = store
        .tasks_by_assignees(&owner)
        .await?
        .into_iter()
        .filter(|t| range.contains(t.created_on()))
        .collect();

    Ok(build_report(
        ReportScope::User,
        user_id,
        range,
        ReportInputs {
            member_count: 1,
            entries,
            task_hours,
            tasks,
        },
        now,
    ))
}

pub async fn department_report(
    store: &dyn RecordStore,
    department: &str,
    range: DateRange,
    now: DateTime<Utc>,
) -> Result<ProductivityReport> {
    let member_ids = ids_of(&store.users_by_department(department).await?);
    let entries = store.time_entries_for_department(department, range).await?;
    let task_hours = store.task_hours_for_owners(&member_ids, range).await?;
    let tasks = store
        .tasks_filtered(&TaskFilter {
            range: Some(range),
            status: None,
            department: Some(department.to_string()),
        })
        .await?;

    Ok(build_report(
        ReportScope::Department,
        department,
        range,
        ReportInputs {
            member_count: member_ids.len() as u64,
            entries,
            task_hours,
            tasks,
        },
        now,
    ))
}
