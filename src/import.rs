//! Loads a JSON bundle of records into the store.
//!
//! ```json
//! { "users": [...], "time_entries": [...], "tasks": [...], "task_time_entries": [...] }
//! ```
//!
//! Every section is optional. The whole bundle is written in one transaction.
//! Records are keyed, so importing the same bundle again replaces rather
//! than duplicates them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::records::{Task, TaskTimeEntry, TimeEntry, User};
use crate::storage::{repository, Database};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordBundle {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub task_time_entries: Vec<TaskTimeEntry>,
}

impl RecordBundle {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Import(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub users: usize,
    pub time_entries: usize,
    pub tasks: usize,
    pub task_time_entries: usize,
}

/// Write the bundle. Users go first so that entries and tasks can reference
/// them; a failure rolls back the whole bundle.
pub async fn import_bundle(db: &Database, bundle: RecordBundle) -> Result<ImportReport> {
    let report = db
        .writer()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for user in &bundle.users {
                repository::upsert_user(&tx, user)?;
            }
            for entry in &bundle.time_entries {
                repository::upsert_time_entry(&tx, entry)?;
            }
            for task in &bundle.tasks {
                repository::upsert_task(&tx, task)?;
            }
            for entry in &bundle.task_time_entries {
                repository::upsert_task_time(&tx, entry)?;
            }
            tx.commit()?;
            Ok::<_, rusqlite::Error>(ImportReport {
                users: bundle.users.len(),
                time_entries: bundle.time_entries.len(),
                tasks: bundle.tasks.len(),
                task_time_entries: bundle.task_time_entries.len(),
            })
        })
        .await
        .map_err(|e| Error::Import(e.to_string()))?;

    log::info!(
        "imported {} users, {} time entries, {} tasks, {} task time entries",
        report.users,
        report.time_entries,
        report.tasks,
        report.task_time_entries
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::range::DateRange;
    use crate::records::TaskStatus;
    use crate::store::RecordStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::io::Write;

    const BUNDLE: &str = r#"{
        "users": [
            {"id": "m1", "name": "Mia", "role": "manager", "department": "Eng"},
            {"id": "e1", "name": "Eli", "email": "eli@example.com", "role": "Employee",
             "department": "Eng", "manager_id": "m1"}
        ],
        "time_entries": [
            {"owner_id": "e1", "date": "2025-03-03", "start_time": "09:00:00",
             "end_time": "17:00:00", "break_minutes": 30, "total_hours": "7.50"}
        ],
        "tasks": [
            {"id": "t1", "assignee_id": "e1", "creator_id": "m1", "status": "In Progress",
             "created_at": "2025-03-01T08:00:00Z"}
        ],
        "task_time_entries": [
            {"task_id": "t1", "owner_id": "e1", "date": "2025-03-03", "hours": "2.25"}
        ]
    }"#;

    #[tokio::test]
    async fn test_import_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUNDLE.as_bytes()).unwrap();

        let db = Database::open_memory().await.unwrap();
        let bundle = RecordBundle::from_path(file.path()).await.unwrap();
        let report = import_bundle(&db, bundle).await.unwrap();
        assert_eq!(
            report,
            ImportReport {
                users: 2,
                time_entries: 1,
                tasks: 1,
                task_time_entries: 1
            }
        );

        let team = db.employees_of("m1").await.unwrap();
        assert_eq!(team.len(), 1);
        assert!(team[0].is_active);

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .unwrap();
        let hours = db
            .total_hours_by_owner(&["e1".to_string()], range)
            .await
            .unwrap();
        assert_eq!(hours["e1"], Decimal::new(750, 2));

        let tasks = db.tasks_by_creator("m1").await.unwrap();
        assert_eq!(tasks[0].status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_reimport_does_not_duplicate_task_time() {
        let db = Database::open_memory().await.unwrap();
        for _ in 0..2 {
            let bundle = RecordBundle::from_json(BUNDLE).unwrap();
            import_bundle(&db, bundle).await.unwrap();
        }

        let counts = db
            .reader()
            .call(|conn| repository::store_counts(conn))
            .await
            .unwrap();
        assert_eq!(counts.users, 2);
        assert_eq!(counts.time_entries, 1);
        assert_eq!(counts.task_time_entries, 1);

        let hours = db.task_hours(&["t1".to_string()]).await.unwrap();
        assert_eq!(hours["t1"], Decimal::new(225, 2));
    }

    #[tokio::test]
    async fn test_bad_reference_rolls_back() {
        let db = Database::open_memory().await.unwrap();
        let bundle = RecordBundle::from_json(
            r#"{"time_entries": [{"owner_id": "ghost", "date": "2025-03-03",
                 "start_time": "09:00:00", "total_hours": "1"}]}"#,
        )
        .unwrap();
        let err = import_bundle(&db, bundle).await.unwrap_err();
        assert!(matches!(err, Error::Import(_)));
    }

    #[test]
    fn test_malformed_json_is_import_error() {
        assert!(matches!(
            RecordBundle::from_json("{\"users\": 3}"),
            Err(Error::Import(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = RecordBundle::from_path("/nonexistent/bundle.json")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Import(_)));
    }
}
