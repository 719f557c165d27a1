use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::repository;
use super::Database;
use crate::error::Result;
use crate::query::range::DateRange;
use crate::records::{Role, Task, TaskStatus, TimeEntry, User};
use crate::store::{RecordStore, TaskFilter};

#[async_trait]
impl RecordStore for Database {
    async fn time_entries_for_owners(
        &self,
        owner_ids: &[String],
        range: DateRange,
    ) -> Result<Vec<TimeEntry>> {
        if owner_ids.is_empty() {
            return Ok(vec![]);
        }
        let ids = owner_ids.to_vec();
        let entries = self
            .reader()
            .call(move |conn| repository::time_entries_for_owners(conn, &ids, range.start, range.end))
            .await?;
        Ok(entries)
    }

    async fn time_entries_for_department(
        &self,
        department: &str,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>> {
        let dept = department.to_string();
        let entries = self
            .reader()
            .call(move |conn| {
                repository::time_entries_for_department(conn, &dept, range.start, range.end)
            })
            .await?;
        Ok(entries)
    }

    async fn time_entries_in_range(&self, range: DateRange) -> Result<Vec<TimeEntry>> {
        let entries = self
            .reader()
            .call(move |conn| repository::time_entries_in_range(conn, range.start, range.end))
            .await?;
        Ok(entries)
    }

    async fn total_hours_by_owner(
        &self,
        owner_ids: &[String],
        range: DateRange,
    ) -> Result<HashMap<String, Decimal>> {
        let entries = self.time_entries_for_owners(owner_ids, range).await?;
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for e in entries {
            *totals.entry(e.owner_id).or_insert(Decimal::ZERO) += e.total_hours;
        }
        Ok(totals)
    }

    async fn total_hours_for_owners_on(
        &self,
        owner_ids: &[String],
        date: NaiveDate,
    ) -> Result<Decimal> {
        let day = DateRange { start: date, end: date };
        let entries = self.time_entries_for_owners(owner_ids, day).await?;
        Ok(entries.iter().map(|e| e.total_hours).sum())
    }

    async fn entry_for_owner_on(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Option<TimeEntry>> {
        let id = owner_id.to_string();
        let entry = self
            .reader()
            .call(move |conn| repository::entry_for_owner_on(conn, &id, date))
            .await?;
        Ok(entry)
    }

    async fn task_hours(&self, task_ids: &[String]) -> Result<HashMap<String, Decimal>> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = task_ids.to_vec();
        let hours = self
            .reader()
            .call(move |conn| repository::task_hours(conn, &ids))
            .await?;
        Ok(hours)
    }

    async fn task_hours_for_owners(
        &self,
        owner_ids: &[String],
        range: DateRange,
    ) -> Result<Decimal> {
        if owner_ids.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let ids = owner_ids.to_vec();
        let total = self
            .reader()
            .call(move |conn| repository::task_hours_for_owners(conn, &ids, range.start, range.end))
            .await?;
        Ok(total)
    }

    async fn tasks_by_assignees(&self, assignee_ids: &[String]) -> Result<Vec<Task>> {
        if assignee_ids.is_empty() {
            return Ok(vec![]);
        }
        let ids = assignee_ids.to_vec();
        let tasks = self
            .reader()
            .call(move |conn| repository::tasks_by_assignees(conn, &ids))
            .await?;
        Ok(tasks)
    }

    async fn tasks_by_creator(&self, creator_id: &str) -> Result<Vec<Task>> {
        let id = creator_id.to_string();
        let tasks = self
            .reader()
            .call(move |conn| repository::tasks_by_creator(conn, &id))
            .await?;
        Ok(tasks)
    }

    async fn tasks_with_status_in_range(
        &self,
        statuses: &[TaskStatus],
        range: DateRange,
    ) -> Result<Vec<Task>> {
        if statuses.is_empty() {
            return Ok(vec![]);
        }
        let statuses = statuses.to_vec();
        let tasks = self
            .reader()
            .call(move |conn| {
                repository::tasks_filtered(conn, Some((range.start, range.end)), &statuses, None)
            })
            .await?;
        Ok(tasks)
    }

    async fn tasks_filtered(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let range = filter.range.map(|r| (r.start, r.end));
        let statuses: Vec<TaskStatus> = filter.status.into_iter().collect();
        let dept = filter.department.clone();
        let tasks = self
            .reader()
            .call(move |conn| repository::tasks_filtered(conn, range, &statuses, dept.as_deref()))
            .await?;
        Ok(tasks)
    }

    async fn employees_of(&self, manager_id: &str) -> Result<Vec<User>> {
        let id = manager_id.to_string();
        let users = self
            .reader()
            .call(move |conn| repository::employees_of(conn, &id))
            .await?;
        Ok(users)
    }

    async fn employee_count_of(&self, manager_id: &str) -> Result<u64> {
        let id = manager_id.to_string();
        let count = self
            .reader()
            .call(move |conn| repository::employee_count_of(conn, &id))
            .await?;
        Ok(count)
    }

    async fn users_by_role(&self, role: Role) -> Result<Vec<User>> {
        let users = self
            .reader()
            .call(move |conn| repository::users_by_role(conn, role.as_str()))
            .await?;
        Ok(users)
    }

    async fn users_by_department(&self, department: &str) -> Result<Vec<User>> {
        let dept = department.to_string();
        let users = self
            .reader()
            .call(move |conn| repository::users_by_department(conn, &dept))
            .await?;
        Ok(users)
    }

    async fn departments(&self) -> Result<Vec<String>> {
        let depts = self
            .reader()
            .call(|conn| repository::departments(conn))
            .await?;
        Ok(depts)
    }

    async fn active_users(&self) -> Result<Vec<User>> {
        let users = self
            .reader()
            .call(|conn| repository::active_users(conn))
            .await?;
        Ok(users)
    }

    async fn clocked_in_users(&self, date: NaiveDate) -> Result<Vec<User>> {
        let users = self
            .reader()
            .call(move |conn| repository::clocked_in_users(conn, date))
            .await?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::TaskTimeEntry;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded() -> Database {
        let db = Database::open_memory().await.unwrap();
        db.writer()
            .call(|conn| {
                for (id, manager, dept) in [
                    ("m1", None, Some("Eng")),
                    ("u1", Some("m1"), Some("Eng")),
                    ("u2", Some("m1"), Some("Eng")),
                    ("u3", None, Some("Sales")),
                ] {
                    repository::upsert_user(
                        conn,
                        &User {
                            id: id.into(),
                            name: id.to_uppercase(),
                            email: String::new(),
                            role: if manager.is_some() { Role::Employee } else { Role::Manager },
                            department: dept.map(str::to_string),
                            manager_id: manager.map(str::to_string),
                            is_active: true,
                        },
                    )?;
                }
                for (owner, day, hours, open) in [
                    ("u1", 6, 800, false),
                    ("u1", 7, 725, false),
                    ("u2", 7, 450, true),
                    ("u3", 7, 300, false),
                ] {
                    repository::upsert_time_entry(
                        conn,
                        &TimeEntry {
                            owner_id: owner.into(),
                            date: ymd(2025, 1, day),
                            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                            end_time: if open { None } else { NaiveTime::from_hms_opt(17, 0, 0) },
                            break_minutes: 0,
                            total_hours: Decimal::new(hours, 2),
                            activity: None,
                        },
                    )?;
                }
                repository::upsert_task(
                    conn,
                    &Task {
                        id: "t1".into(),
                        title: "Review".into(),
                        assignee_id: "u1".into(),
                        creator_id: "m1".into(),
                        status: TaskStatus::InProgress,
                        due_at: None,
                        created_at: Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap(),
                        completed_at: None,
                        is_rejected: false,
                    },
                )?;
                repository::upsert_task_time(
                    conn,
                    &TaskTimeEntry {
                        task_id: "t1".into(),
                        owner_id: "u1".into(),
                        date: ymd(2025, 1, 6),
                        hours: Decimal::new(200, 2),
                    },
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_total_hours_by_owner_omits_idle_owners() {
        let db = seeded().await;
        let range = DateRange::new(ymd(2025, 1, 1), ymd(2025, 1, 31)).unwrap();
        let ids = vec!["u1".to_string(), "u2".to_string(), "ghost".to_string()];

        let totals = db.total_hours_by_owner(&ids, range).await.unwrap();
        assert_eq!(totals.get("u1"), Some(&Decimal::new(1525, 2)));
        assert_eq!(totals.get("u2"), Some(&Decimal::new(450, 2)));
        assert!(!totals.contains_key("ghost"));

        let day = db.total_hours_for_owners_on(&ids, ymd(2025, 1, 7)).await.unwrap();
        assert_eq!(day, Decimal::new(1175, 2));
    }

    #[tokio::test]
    async fn test_membership_and_departments() {
        let db = seeded().await;
        assert_eq!(db.employees_of("m1").await.unwrap().len(), 2);
        assert_eq!(db.employee_count_of("m1").await.unwrap(), 2);
        assert!(db.employees_of("nobody").await.unwrap().is_empty());
        assert_eq!(
            db.departments().await.unwrap(),
            vec!["Eng".to_string(), "Sales".to_string()]
        );
        assert_eq!(db.users_by_role(Role::Manager).await.unwrap().len(), 2);
        assert_eq!(db.users_by_department("Eng").await.unwrap().len(), 3);
        assert_eq!(db.active_users().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_clocked_in_and_department_entries() {
        let db = seeded().await;
        let clocked = db.clocked_in_users(ymd(2025, 1, 7)).await.unwrap();
        assert_eq!(clocked.len(), 1);
        assert_eq!(clocked[0].id, "u2");

        let range = DateRange::new(ymd(2025, 1, 7), ymd(2025, 1, 7)).unwrap();
        let eng = db.time_entries_for_department("Eng", range).await.unwrap();
        assert_eq!(eng.len(), 2);
        assert_eq!(db.time_entries_in_range(range).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_task_queries() {
        let db = seeded().await;
        let range = DateRange::new(ymd(2025, 1, 1), ymd(2025, 1, 31)).unwrap();

        let active = db
            .tasks_with_status_in_range(&[TaskStatus::Pending, TaskStatus::InProgress], range)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert!(db
            .tasks_with_status_in_range(&[TaskStatus::Completed], range)
            .await
            .unwrap()
            .is_empty());

        let filter = TaskFilter {
            department: Some("Sales".into()),
            ..Default::default()
        };
        assert!(db.tasks_filtered(&filter).await.unwrap().is_empty());

        let hours = db.task_hours(&["t1".to_string()]).await.unwrap();
        assert_eq!(hours["t1"], Decimal::from(2));
        let focus = db
            .task_hours_for_owners(&["u1".to_string()], range)
            .await
            .unwrap();
        assert_eq!(focus, Decimal::from(2));
    }

    #[tokio::test]
    async fn test_empty_id_sets_short_circuit() {
        let db = seeded().await;
        let range = DateRange::new(ymd(2025, 1, 1), ymd(2025, 1, 31)).unwrap();
        assert!(db.time_entries_for_owners(&[], range).await.unwrap().is_empty());
        assert!(db.total_hours_by_owner(&[], range).await.unwrap().is_empty());
        assert!(db.tasks_by_assignees(&[]).await.unwrap().is_empty());
        assert_eq!(db.task_hours_for_owners(&[], range).await.unwrap(), Decimal::ZERO);
    }
}
