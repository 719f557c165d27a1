use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use timetrack_analytics::metrics::{DailyHours, DepartmentAnalytics, ProductivityReport};
use timetrack_analytics::{Lookback, TimeTrackAnalytics};

#[derive(Parser)]
#[command(
    name = "timetrack-analytics",
    about = "Team and organization productivity analytics over time-tracking records"
)]
struct Cli {
    /// Database path (default: ~/.timetrack-analytics/analytics.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load users, time entries and tasks from a JSON bundle
    Import {
        /// Path to the bundle file
        file: String,
    },
    /// Show record counts
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Views over a manager's team
    Team {
        #[command(subcommand)]
        target: TeamTarget,
    },
    /// Organization-wide views
    Org {
        #[command(subcommand)]
        target: OrgTarget,
    },
    /// Trailing-week productivity snapshot for a user
    Productivity {
        /// User id
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Productivity report over a date range
    Report {
        #[command(subcommand)]
        target: ReportTarget,
    },
}

#[derive(Subcommand)]
enum TeamTarget {
    /// Hours and task completion for the team
    Summary {
        #[arg(long)]
        manager: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Team hours per day or week
    Trend {
        #[arg(long)]
        manager: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// day or week
        #[arg(long, default_value = "day")]
        group_by: String,
        #[arg(long)]
        json: bool,
    },
    /// Per-member efficiency, best first
    Performance {
        #[arg(long)]
        manager: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Task status counts for tasks the manager created
    Breakdown {
        #[arg(long)]
        manager: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Team size, open tasks and today's hours
    Dashboard {
        #[arg(long)]
        manager: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum OrgTarget {
    /// Organization summary with per-department metrics
    Summary {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Lookback period: 7, 14, 30 or 90 days (overrides --start)
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Metrics for one department
    Department {
        name: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Organization hours per day, ending today
    HoursTrend {
        #[arg(long, default_value = "7")]
        days: u32,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ReportTarget {
    /// Report for a single user
    User {
        user: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Report for a department
    Department {
        name: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

fn parse_date(value: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
        })
        .transpose()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => timetrack_analytics::Database::open_at(path).await?,
        None => timetrack_analytics::Database::open().await?,
    };
    let analytics = TimeTrackAnalytics::new(db).await?;

    match cli.command {
        Commands::Import { file } => {
            let report = analytics.import(&file).await?;
            println!("Imported from {file}");
            println!("  Users:             {}", report.users);
            println!("  Time entries:      {}", report.time_entries);
            println!("  Tasks:             {}", report.tasks);
            println!("  Task time entries: {}", report.task_time_entries);
        }
        Commands::Status => {
            print_status(&analytics).await?;
        }
        Commands::Config { action } => {
            handle_config(&analytics, action).await?;
        }
        Commands::Team { target } => {
            handle_team(&analytics, target).await?;
        }
        Commands::Org { target } => {
            handle_org(&analytics, target).await?;
        }
        Commands::Productivity { user, json } => {
            let p = analytics.productivity(&user).await?;
            if json {
                print_json(&p)?;
            } else {
                println!("Productivity: {user} (last 7 days)");
                let days: Vec<String> = p.daily_hours.iter().map(|h| h.to_string()).collect();
                println!("  Daily hours:     {}", days.join(" "));
                println!("  Total hours:     {}", p.total_hours_logged);
                println!("  Weekly average:  {}", p.weekly_average);
                println!(
                    "  Tasks:           {} total, {} completed, {} in progress, {} pending",
                    p.total_tasks, p.completed_tasks, p.in_progress_tasks, p.pending_tasks
                );
                println!("  Completion rate: {}%", p.task_completion_rate);
                println!("  Efficiency:      {}%", p.efficiency_score);
            }
        }
        Commands::Report { target } => {
            handle_report(&analytics, target).await?;
        }
    }

    Ok(())
}

async fn print_status(analytics: &TimeTrackAnalytics) -> anyhow::Result<()> {
    let counts = analytics.status().await?;
    let config = analytics.config();
    println!("Store Status");
    println!("  Users:             {}", counts.users);
    println!("  Time entries:      {}", counts.time_entries);
    println!("  Tasks:             {}", counts.tasks);
    println!("  Task time entries: {}", counts.task_time_entries);
    println!(
        "  Latest entry:      {}",
        counts.latest_entry.unwrap_or_else(|| "none".to_string())
    );
    println!("  Cache TTL:         {} min", config.cache_ttl_minutes);
    Ok(())
}

async fn handle_config(analytics: &TimeTrackAnalytics, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match analytics.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            analytics.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = analytics.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

async fn handle_team(analytics: &TimeTrackAnalytics, target: TeamTarget) -> anyhow::Result<()> {
    match target {
        TeamTarget::Summary { manager, start, end, json } => {
            let s = analytics
                .team_summary(&manager, parse_date(start.as_deref())?, parse_date(end.as_deref())?)
                .await?;
            if json {
                print_json(&s)?;
            } else {
                println!("Team Summary: {} ({} to {})", s.manager_id, s.calculated_from, s.calculated_to);
                println!("  Members:         {}", s.team_member_count);
                println!("  Total hours:     {}", s.total_team_hours);
                println!("  Avg per member:  {}", s.average_hours_per_member);
                println!(
                    "  Tasks:           {}/{} completed ({}%)",
                    s.completed_tasks_count, s.total_tasks_count, s.completion_rate
                );
            }
        }
        TeamTarget::Trend { manager, start, end, group_by, json } => {
            let t = analytics
                .team_hours_trend(
                    &manager,
                    parse_date(start.as_deref())?,
                    parse_date(end.as_deref())?,
                    &group_by,
                )
                .await?;
            if json {
                print_json(&t)?;
            } else {
                println!("Team Hours Trend: {} (by {group_by})", t.manager_id);
                for p in &t.trend_data {
                    println!(
                        "  {}  {:>8} h  {:>3} members  {:>3} completed",
                        p.date, p.total_hours, p.active_members, p.tasks_completed
                    );
                }
            }
        }
        TeamTarget::Performance { manager, start, end, json } => {
            let perf = analytics
                .team_member_performance(
                    &manager,
                    parse_date(start.as_deref())?,
                    parse_date(end.as_deref())?,
                )
                .await?;
            if json {
                print_json(&perf)?;
            } else if perf.members.is_empty() {
                println!("No team members found for {manager}.");
            } else {
                println!("Team Member Performance: {}", perf.manager_id);
                for m in &perf.members {
                    println!(
                        "  {:<24} {:>7}%  {:<15} {:>3}/{:<3} tasks  {:>8} h  {} overdue",
                        m.name,
                        m.efficiency_score,
                        m.performance_status,
                        m.tasks_completed,
                        m.tasks_assigned,
                        m.total_hours,
                        m.overdue_tasks_count
                    );
                }
            }
        }
        TeamTarget::Breakdown { manager, start, end, json } => {
            let b = analytics
                .task_completion_breakdown(
                    &manager,
                    parse_date(start.as_deref())?,
                    parse_date(end.as_deref())?,
                )
                .await?;
            if json {
                print_json(&b)?;
            } else {
                println!("Task Breakdown: {manager}");
                println!("  Completed:   {}", b.completed_count);
                println!("  In progress: {}", b.in_progress_count);
                println!("  Pending:     {}", b.pending_count);
                println!("  Rejected:    {}", b.rejected_count);
                println!("  Overdue:     {}", b.overdue_count);
                println!("  Total:       {} ({}% complete)", b.total_count, b.completion_percentage);
            }
        }
        TeamTarget::Dashboard { manager, json } => {
            let d = analytics.manager_dashboard(&manager).await?;
            if json {
                print_json(&d)?;
            } else {
                println!("Manager Dashboard: {}", d.manager_id);
                println!("  Team members: {}", d.team_member_count);
                println!("  Active tasks: {}", d.active_tasks);
                println!("  Hours today:  {}", d.team_hours_today);
            }
        }
    }
    Ok(())
}

async fn handle_org(analytics: &TimeTrackAnalytics, target: OrgTarget) -> anyhow::Result<()> {
    match target {
        OrgTarget::Summary { start, end, period, json } => {
            let period = period
                .as_deref()
                .map(|p| p.parse::<Lookback>())
                .transpose()?
                .map(|p| p.days());
            let o = analytics
                .organization_summary(parse_date(start.as_deref())?, parse_date(end.as_deref())?, period)
                .await?;
            if json {
                print_json(&o)?;
            } else {
                println!("Organization Summary ({})", o.period_range);
                println!(
                    "  Employees:    {} total, {} clocked in",
                    o.total_employees, o.active_employees
                );
                println!(
                    "  Roles:        {} employees, {} managers, {} admins",
                    o.employee_count, o.manager_count, o.admin_count
                );
                println!("  Hours:        {} ({} per employee)", o.total_hours_logged, o.avg_hours_per_employee);
                println!(
                    "  Tasks:        {} completed, {} in progress, {} pending ({}%)",
                    o.completed_tasks, o.in_progress_tasks, o.pending_tasks, o.task_completion_percentage
                );
                println!("  Departments:  {} ({} employees avg)", o.department_metrics.len(), o.avg_employees_per_department);
                for d in &o.department_metrics {
                    print_department(d);
                }
                print_daily_hours(&o.hours_trend_data);
            }
        }
        OrgTarget::Department { name, start, end, json } => {
            let d = analytics
                .department_analytics(&name, parse_date(start.as_deref())?, parse_date(end.as_deref())?)
                .await?;
            if json {
                print_json(&d)?;
            } else {
                print_department(&d);
            }
        }
        OrgTarget::HoursTrend { days, json } => {
            let trend = analytics.hours_trend(days).await?;
            if json {
                print_json(&trend)?;
            } else {
                print_daily_hours(&trend);
            }
        }
    }
    Ok(())
}

async fn handle_report(analytics: &TimeTrackAnalytics, target: ReportTarget) -> anyhow::Result<()> {
    let (report, json) = match target {
        ReportTarget::User { user, start, end, json } => (
            analytics
                .user_report(&user, parse_date(start.as_deref())?, parse_date(end.as_deref())?)
                .await?,
            json,
        ),
        ReportTarget::Department { name, start, end, json } => (
            analytics
                .department_report(&name, parse_date(start.as_deref())?, parse_date(end.as_deref())?)
                .await?,
            json,
        ),
    };
    if json {
        print_json(&report)
    } else {
        print_report(&report);
        Ok(())
    }
}

fn print_department(d: &DepartmentAnalytics) {
    println!("  {}:", d.department_name);
    println!("    Employees: {}", d.employee_count);
    println!("    Hours:     {} ({} avg)", d.total_hours, d.avg_hours_per_employee);
    println!(
        "    Tasks:     {} completed, {} in progress, {} pending",
        d.completed_tasks, d.in_progress_tasks, d.pending_tasks
    );
}

fn print_daily_hours(days: &[DailyHours]) {
    println!("  Hours Trend:");
    for d in days {
        println!("    {}  {:>8} h  {:>3} active", d.date_label, d.total_hours, d.active_employees);
    }
}

fn print_report(r: &ProductivityReport) {
    println!("Productivity Report: {} ({} to {})", r.subject, r.range.start, r.range.end);
    println!("  Members:       {}", r.member_count);
    println!("  Total hours:   {}", r.total_hours);
    println!("  Task hours:    {} ({}% focus)", r.task_hours, r.focus_percentage);
    println!(
        "  Tasks:         {}/{} completed ({}%)",
        r.tasks_completed, r.tasks_assigned, r.completion_rate
    );
    println!("  Score:         {} ({})", r.productivity_score, r.performance_status);
}
