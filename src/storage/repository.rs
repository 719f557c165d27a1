use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::records::{Role, Task, TaskStatus, TaskTimeEntry, TimeEntry, User};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";

const USER_COLUMNS: &str =
    "u.user_id, u.name, u.email, u.role, u.department, u.manager_id, u.is_active";
const ENTRY_COLUMNS: &str =
    "e.owner_id, e.entry_date, e.start_time, e.end_time, e.break_minutes, e.total_hours, e.activity";
const TASK_COLUMNS: &str = "t.task_id, t.title, t.assignee_id, t.creator_id, t.status, \
     t.due_at, t.created_at, t.completed_at, t.is_rejected";

// ── Users ──────────────────────────────────────────────────────────

/// Insert or update a user. Updates keep the original rowid, so membership
/// enumeration order stays the insertion order.
pub fn upsert_user(conn: &Connection, user: &User) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO users (user_id, name, email, role, department, manager_id, is_active, cached_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
         ON CONFLICT(user_id) DO UPDATE SET
            name=excluded.name, email=excluded.email, role=excluded.role,
            department=excluded.department, manager_id=excluded.manager_id,
            is_active=excluded.is_active, cached_at=excluded.cached_at",
        params![
            user.id,
            user.name,
            user.email,
            user.role.as_str(),
            user.department,
            user.manager_id,
            user.is_active,
        ],
    )?;
    Ok(())
}

pub fn employees_of(conn: &Connection, manager_id: &str) -> Result<Vec<User>, rusqlite::Error> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u
         WHERE u.manager_id = ?1 AND u.is_active = 1
         ORDER BY u.rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![manager_id], row_to_user)?;
    rows.collect()
}

pub fn employee_count_of(conn: &Connection, manager_id: &str) -> Result<u64, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE manager_id = ?1 AND is_active = 1",
        params![manager_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

pub fn users_by_role(conn: &Connection, role: &str) -> Result<Vec<User>, rusqlite::Error> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u
         WHERE u.role = ?1 AND u.is_active = 1
         ORDER BY u.rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![role], row_to_user)?;
    rows.collect()
}

pub fn users_by_department(
    conn: &Connection,
    department: &str,
) -> Result<Vec<User>, rusqlite::Error> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u
         WHERE u.department = ?1 AND u.is_active = 1
         ORDER BY u.rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![department], row_to_user)?;
    rows.collect()
}

pub fn departments(conn: &Connection) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT department FROM users
         WHERE department IS NOT NULL AND department != '' AND is_active = 1
         ORDER BY department",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

pub fn active_users(conn: &Connection) -> Result<Vec<User>, rusqlite::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.is_active = 1 ORDER BY u.rowid");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_user)?;
    rows.collect()
}

/// Active users whose entry for `date` has no end time recorded.
pub fn clocked_in_users(conn: &Connection, date: NaiveDate) -> Result<Vec<User>, rusqlite::Error> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users u
         JOIN time_entries e ON e.owner_id = u.user_id
         WHERE u.is_active = 1 AND e.entry_date = ?1 AND e.end_time IS NULL
         ORDER BY u.rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![date_key(date)], row_to_user)?;
    rows.collect()
}

// ── Time entries ───────────────────────────────────────────────────

/// Insert or replace the single entry for `(owner, date)`.
pub fn upsert_time_entry(conn: &Connection, entry: &TimeEntry) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO time_entries (
            owner_id, entry_date, start_time, end_time, break_minutes, total_hours, activity
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(owner_id, entry_date) DO UPDATE SET
            start_time=excluded.start_time, end_time=excluded.end_time,
            break_minutes=excluded.break_minutes, total_hours=excluded.total_hours,
            activity=excluded.activity",
        params![
            entry.owner_id,
            date_key(entry.date),
            entry.start_time.format(TIME_FMT).to_string(),
            entry.end_time.map(|t| t.format(TIME_FMT).to_string()),
            entry.break_minutes,
            entry.total_hours.to_string(),
            entry.activity,
        ],
    )?;
    Ok(())
}

pub fn time_entries_for_owners(
    conn: &Connection,
    owner_ids: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TimeEntry>, rusqlite::Error> {
    if owner_ids.is_empty() {
        return Ok(vec![]);
    }
    let n = owner_ids.len();
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries e
         WHERE e.owner_id IN ({}) AND e.entry_date >= ?{} AND e.entry_date <= ?{}
         ORDER BY e.entry_date, e.owner_id",
        placeholders(n, 1),
        n + 1,
        n + 2
    );
    let mut args: Vec<String> = owner_ids.to_vec();
    args.push(date_key(start));
    args.push(date_key(end));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), row_to_time_entry)?;
    rows.collect()
}

pub fn time_entries_for_department(
    conn: &Connection,
    department: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TimeEntry>, rusqlite::Error> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries e
         JOIN users u ON u.user_id = e.owner_id
         WHERE u.department = ?1 AND u.is_active = 1
           AND e.entry_date >= ?2 AND e.entry_date <= ?3
         ORDER BY e.entry_date, e.owner_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![department, date_key(start), date_key(end)],
        row_to_time_entry,
    )?;
    rows.collect()
}

pub fn time_entries_in_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TimeEntry>, rusqlite::Error> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries e
         WHERE e.entry_date >= ?1 AND e.entry_date <= ?2
         ORDER BY e.entry_date, e.owner_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![date_key(start), date_key(end)], row_to_time_entry)?;
    rows.collect()
}

pub fn entry_for_owner_on(
    conn: &Connection,
    owner_id: &str,
    date: NaiveDate,
) -> Result<Option<TimeEntry>, rusqlite::Error> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries e
         WHERE e.owner_id = ?1 AND e.entry_date = ?2"
    );
    conn.query_row(&sql, params![owner_id, date_key(date)], row_to_time_entry)
        .optional()
}

// ── Task time ──────────────────────────────────────────────────────

/// Insert or replace the hours one owner logged on a task for one day.
pub fn upsert_task_time(conn: &Connection, entry: &TaskTimeEntry) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO task_time_entries (task_id, owner_id, entry_date, hours)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(task_id, owner_id, entry_date) DO UPDATE SET hours=excluded.hours",
        params![
            entry.task_id,
            entry.owner_id,
            date_key(entry.date),
            entry.hours.to_string(),
        ],
    )?;
    Ok(())
}

/// Hours are stored as decimal text, so they are summed here rather than
/// with SQL `SUM` to keep fixed-point precision.
pub fn task_hours(
    conn: &Connection,
    task_ids: &[String],
) -> Result<HashMap<String, Decimal>, rusqlite::Error> {
    let mut totals = HashMap::new();
    if task_ids.is_empty() {
        return Ok(totals);
    }
    let sql = format!(
        "SELECT task_id, hours FROM task_time_entries WHERE task_id IN ({})",
        placeholders(task_ids.len(), 1)
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(task_ids.iter()))?;
    while let Some(row) = rows.next()? {
        let task_id: String = row.get(0)?;
        let hours = decimal_col(row, 1)?;
        *totals.entry(task_id).or_insert(Decimal::ZERO) += hours;
    }
    Ok(totals)
}

pub fn task_hours_for_owners(
    conn: &Connection,
    owner_ids: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Decimal, rusqlite::Error> {
    if owner_ids.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let n = owner_ids.len();
    let sql = format!(
        "SELECT hours FROM task_time_entries
         WHERE owner_id IN ({}) AND entry_date >= ?{} AND entry_date <= ?{}",
        placeholders(n, 1),
        n + 1,
        n + 2
    );
    let mut args: Vec<String> = owner_ids.to_vec();
    args.push(date_key(start));
    args.push(date_key(end));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    let mut total = Decimal::ZERO;
    while let Some(row) = rows.next()? {
        total += decimal_col(row, 0)?;
    }
    Ok(total)
}

// ── Tasks ──────────────────────────────────────────────────────────

pub fn upsert_task(conn: &Connection, task: &Task) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO tasks (
            task_id, title, assignee_id, creator_id, status,
            due_at, created_at, created_date, completed_at, is_rejected
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(task_id) DO UPDATE SET
            title=excluded.title, assignee_id=excluded.assignee_id,
            creator_id=excluded.creator_id, status=excluded.status,
            due_at=excluded.due_at, created_at=excluded.created_at,
            created_date=excluded.created_date, completed_at=excluded.completed_at,
            is_rejected=excluded.is_rejected",
        params![
            task.id,
            task.title,
            task.assignee_id,
            task.creator_id,
            task.status.as_str(),
            task.due_at.map(|d| d.to_rfc3339()),
            task.created_at.to_rfc3339(),
            date_key(task.created_on()),
            task.completed_at.map(|d| d.to_rfc3339()),
            task.is_rejected,
        ],
    )?;
    Ok(())
}

pub fn tasks_by_assignees(
    conn: &Connection,
    assignee_ids: &[String],
) -> Result<Vec<Task>, rusqlite::Error> {
    if assignee_ids.is_empty() {
        return Ok(vec![]);
    }
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t
         WHERE t.assignee_id IN ({})
         ORDER BY t.created_at, t.task_id",
        placeholders(assignee_ids.len(), 1)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(assignee_ids.iter()), row_to_task)?;
    rows.collect()
}

pub fn tasks_by_creator(conn: &Connection, creator_id: &str) -> Result<Vec<Task>, rusqlite::Error> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t
         WHERE t.creator_id = ?1
         ORDER BY t.created_at, t.task_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![creator_id], row_to_task)?;
    rows.collect()
}

/// Optional filters over tasks. The date range applies to the created date,
/// the department to the assignee.
pub fn tasks_filtered(
    conn: &Connection,
    range: Option<(NaiveDate, NaiveDate)>,
    statuses: &[TaskStatus],
    department: Option<&str>,
) -> Result<Vec<Task>, rusqlite::Error> {
    let mut join = "";
    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some((start, end)) = range {
        args.push(date_key(start));
        clauses.push(format!("t.created_date >= ?{}", args.len()));
        args.push(date_key(end));
        clauses.push(format!("t.created_date <= ?{}", args.len()));
    }
    if !statuses.is_empty() {
        let first = args.len() + 1;
        args.extend(statuses.iter().map(|s| s.as_str().to_string()));
        clauses.push(format!("t.status IN ({})", placeholders(statuses.len(), first)));
    }
    if let Some(dept) = department {
        join = "JOIN users u ON u.user_id = t.assignee_id";
        args.push(dept.to_string());
        clauses.push(format!("u.department = ?{} AND u.is_active = 1", args.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t {join} {where_clause}
         ORDER BY t.created_at, t.task_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), row_to_task)?;
    rows.collect()
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

// ── Status ─────────────────────────────────────────────────────────

/// Row counts per table, for the CLI status view.
#[derive(Debug, Clone, Default)]
pub struct StoreCounts {
    pub users: i64,
    pub time_entries: i64,
    pub tasks: i64,
    pub task_time_entries: i64,
    pub latest_entry: Option<String>,
}

pub fn store_counts(conn: &Connection) -> Result<StoreCounts, rusqlite::Error> {
    let count = |table: &str| -> Result<i64, rusqlite::Error> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
    };
    Ok(StoreCounts {
        users: count("users")?,
        time_entries: count("time_entries")?,
        tasks: count("tasks")?,
        task_time_entries: count("task_time_entries")?,
        latest_entry: conn.query_row("SELECT MAX(entry_date) FROM time_entries", [], |row| {
            row.get(0)
        })?,
    })
}

// ── Helpers ────────────────────────────────────────────────────────

fn date_key(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

/// `?first, ?first+1, ...` for `n` parameters.
fn placeholders(n: usize, first: usize) -> String {
    (first..first + n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn date_col(row: &Row<'_>, idx: usize) -> Result<NaiveDate, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FMT).map_err(|e| conversion_error(idx, e))
}

fn time_col(row: &Row<'_>, idx: usize) -> Result<Option<NaiveTime>, rusqlite::Error> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveTime::parse_from_str(&s, TIME_FMT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn timestamp_col(row: &Row<'_>, idx: usize) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn decimal_col(row: &Row<'_>, idx: usize) -> Result<Decimal, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn row_to_user(row: &Row<'_>) -> Result<User, rusqlite::Error> {
    let role: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: role.parse::<Role>().map_err(|e| conversion_error(3, e))?,
        department: row.get(4)?,
        manager_id: row.get(5)?,
        is_active: row.get(6)?,
    })
}

fn row_to_time_entry(row: &Row<'_>) -> Result<TimeEntry, rusqlite::Error> {
    Ok(TimeEntry {
        owner_id: row.get(0)?,
        date: date_col(row, 1)?,
        start_time: time_col(row, 2)?.ok_or(rusqlite::Error::InvalidColumnType(
            2,
            "start_time".into(),
            Type::Null,
        ))?,
        end_time: time_col(row, 3)?,
        break_minutes: row.get(4)?,
        total_hours: decimal_col(row, 5)?,
        activity: row.get(6)?,
    })
}

fn row_to_task(row: &Row<'_>) -> Result<Task, rusqlite::Error> {
    let status: String = row.get(4)?;
    let created_at = timestamp_col(row, 6)?.ok_or(rusqlite::Error::InvalidColumnType(
        6,
        "created_at".into(),
        Type::Null,
    ))?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        assignee_id: row.get(2)?,
        creator_id: row.get(3)?,
        status: status.parse::<TaskStatus>().map_err(|e| conversion_error(4, e))?,
        due_at: timestamp_col(row, 5)?,
        created_at,
        completed_at: timestamp_col(row, 7)?,
        is_rejected: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user(id: &str, manager: Option<&str>, dept: Option<&str>) -> User {
        User {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            role: if manager.is_some() { Role::Employee } else { Role::Manager },
            department: dept.map(str::to_string),
            manager_id: manager.map(str::to_string),
            is_active: true,
        }
    }

    fn entry(owner: &str, date: NaiveDate, hours: &str, open: bool) -> TimeEntry {
        TimeEntry {
            owner_id: owner.to_string(),
            date,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: if open { None } else { NaiveTime::from_hms_opt(17, 30, 0) },
            break_minutes: 30,
            total_hours: Decimal::from_str(hours).unwrap(),
            activity: Some("Development".into()),
        }
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                set_config(conn, "cache_ttl_minutes", "5")?;
                let val = get_config(conn, "cache_ttl_minutes")?;
                assert_eq!(val, Some("5".to_string()));

                let missing = get_config(conn, "nonexistent")?;
                assert_eq!(missing, None);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_user_round_trip_keeps_insertion_order() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                upsert_user(conn, &user("m1", None, Some("Eng")))?;
                upsert_user(conn, &user("zed", Some("m1"), Some("Eng")))?;
                upsert_user(conn, &user("amy", Some("m1"), Some("Ops")))?;
                // Updating an existing member must not move it to the end
                let mut renamed = user("zed", Some("m1"), Some("Eng"));
                renamed.name = "Zed Renamed".into();
                upsert_user(conn, &renamed)?;

                let team = employees_of(conn, "m1")?;
                let ids: Vec<_> = team.iter().map(|u| u.id.as_str()).collect();
                assert_eq!(ids, vec!["zed", "amy"]);
                assert_eq!(team[0].name, "Zed Renamed");
                assert_eq!(employee_count_of(conn, "m1")?, 2);
                assert_eq!(employee_count_of(conn, "nobody")?, 0);

                assert_eq!(departments(conn)?, vec!["Eng".to_string(), "Ops".to_string()]);
                assert_eq!(users_by_role(conn, "Manager")?.len(), 1);
                assert_eq!(users_by_department(conn, "Eng")?.len(), 2);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_time_entry_unique_per_owner_and_date() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                upsert_user(conn, &user("u1", None, None))?;
                upsert_time_entry(conn, &entry("u1", ymd(2025, 1, 6), "8.00", false))?;
                upsert_time_entry(conn, &entry("u1", ymd(2025, 1, 6), "7.25", false))?;
                upsert_time_entry(conn, &entry("u1", ymd(2025, 1, 7), "6.50", true))?;

                let rows = time_entries_for_owners(
                    conn,
                    &["u1".to_string()],
                    ymd(2025, 1, 1),
                    ymd(2025, 1, 31),
                )?;
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].total_hours, Decimal::new(725, 2));
                assert_eq!(rows[0].end_time, NaiveTime::from_hms_opt(17, 30, 0));
                assert!(rows[1].is_clocked_in());

                let single = entry_for_owner_on(conn, "u1", ymd(2025, 1, 7))?.unwrap();
                assert_eq!(single.total_hours, Decimal::new(650, 2));
                assert!(entry_for_owner_on(conn, "u1", ymd(2025, 1, 8))?.is_none());

                let open = clocked_in_users(conn, ymd(2025, 1, 7))?;
                assert_eq!(open.len(), 1);
                assert!(clocked_in_users(conn, ymd(2025, 1, 6))?.is_empty());
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_tasks_and_task_hours() {
        let db = Database::open_memory().await.unwrap();

        db.writer()
            .call(|conn| {
                upsert_user(conn, &user("m1", None, Some("Eng")))?;
                upsert_user(conn, &user("u1", Some("m1"), Some("Eng")))?;
                upsert_user(conn, &user("u2", Some("m1"), Some("Ops")))?;

                let base = Task {
                    id: "t1".into(),
                    title: "Ship it".into(),
                    assignee_id: "u1".into(),
                    creator_id: "m1".into(),
                    status: TaskStatus::Completed,
                    due_at: Some(Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap()),
                    created_at: Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
                    completed_at: Some(Utc.with_ymd_and_hms(2025, 1, 10, 16, 0, 0).unwrap()),
                    is_rejected: false,
                };
                upsert_task(conn, &base)?;
                upsert_task(
                    conn,
                    &Task {
                        id: "t2".into(),
                        assignee_id: "u2".into(),
                        status: TaskStatus::Pending,
                        completed_at: None,
                        created_at: Utc.with_ymd_and_hms(2025, 2, 2, 9, 0, 0).unwrap(),
                        ..base.clone()
                    },
                )?;

                upsert_task_time(
                    conn,
                    &TaskTimeEntry {
                        task_id: "t1".into(),
                        owner_id: "u1".into(),
                        date: ymd(2025, 1, 3),
                        hours: Decimal::new(350, 2),
                    },
                )?;
                upsert_task_time(
                    conn,
                    &TaskTimeEntry {
                        task_id: "t1".into(),
                        owner_id: "u1".into(),
                        date: ymd(2025, 1, 4),
                        hours: Decimal::new(125, 2),
                    },
                )?;

                let fetched = tasks_by_creator(conn, "m1")?;
                assert_eq!(fetched.len(), 2);
                assert_eq!(fetched[0], base);

                assert_eq!(tasks_by_assignees(conn, &["u2".to_string()])?.len(), 1);
                assert!(tasks_by_assignees(conn, &[])?.is_empty());

                let january = tasks_filtered(conn, Some((ymd(2025, 1, 1), ymd(2025, 1, 31))), &[], None)?;
                assert_eq!(january.len(), 1);
                let pending = tasks_filtered(conn, None, &[TaskStatus::Pending], None)?;
                assert_eq!(pending[0].id, "t2");
                let eng = tasks_filtered(conn, None, &[], Some("Eng"))?;
                assert_eq!(eng.len(), 1);
                assert_eq!(eng[0].id, "t1");

                let hours = task_hours(conn, &["t1".to_string(), "t2".to_string()])?;
                assert_eq!(hours.get("t1"), Some(&Decimal::new(475, 2)));
                assert!(!hours.contains_key("t2"));

                let focused = task_hours_for_owners(conn, &["u1".to_string()], ymd(2025, 1, 4), ymd(2025, 1, 31))?;
                assert_eq!(focused, Decimal::new(125, 2));
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(3, 1), "?1,?2,?3");
        assert_eq!(placeholders(2, 4), "?4,?5");
    }
}
