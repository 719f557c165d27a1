pub mod cache;
pub mod config;
pub mod date_util;
pub mod error;
pub mod import;
pub mod metrics;
pub mod query;
pub mod records;
pub mod score;
pub mod storage;
pub mod store;
pub mod trend;

pub use cache::ProductivityCache;
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use import::{ImportReport, RecordBundle};
pub use metrics::{
    DailyHours, DepartmentAnalytics, ManagerDashboardStats, OrganizationSummary,
    ProductivityReport, ProductivitySnapshot, TaskCompletionBreakdown, TeamHoursTrend,
    TeamMemberPerformance, TeamSummary,
};
pub use query::range::{DateRange, GroupBy, Lookback};
pub use records::{Role, Task, TaskStatus, TaskTimeEntry, TimeEntry, User};
pub use storage::repository::StoreCounts;
pub use storage::Database;
pub use store::{RecordStore, TaskFilter};

use std::path::Path;

use chrono::{NaiveDate, Utc};

use storage::repository;

/// Main entry point: validates caller input, resolves default ranges from
/// [`EngineConfig`], and runs the aggregation engine against the store.
pub struct TimeTrackAnalytics {
    db: Database,
    config: EngineConfig,
    cache: ProductivityCache,
}

impl TimeTrackAnalytics {
    /// Load configuration from the database and set up the snapshot cache.
    pub async fn new(db: Database) -> Result<Self> {
        let config = EngineConfig::load(&db).await?;
        Ok(Self::with_config(db, config))
    }

    pub fn with_config(db: Database, config: EngineConfig) -> Self {
        Self {
            cache: ProductivityCache::new(config.cache_ttl()),
            db,
            config,
        }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn team_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<DateRange> {
        DateRange::resolve(start, end, self.config.default_range_days, Self::today())
    }

    // ── Team views ─────────────────────────────────────────────────

    pub async fn team_summary(
        &self,
        manager_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<TeamSummary> {
        let range = self.team_range(start, end)?;
        metrics::team_summary(&self.db, manager_id, range, Utc::now()).await
    }

    /// `group_by` must be `day` or `week`.
    pub async fn team_hours_trend(
        &self,
        manager_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        group_by: &str,
    ) -> Result<TeamHoursTrend> {
        let group_by: GroupBy = group_by.parse()?;
        let range = self.team_range(start, end)?;
        metrics::team_hours_trend(&self.db, manager_id, range, group_by).await
    }

    pub async fn team_member_performance(
        &self,
        manager_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<TeamMemberPerformance> {
        let range = self.team_range(start, end)?;
        metrics::team_member_performance(&self.db, manager_id, range, Utc::now()).await
    }

    pub async fn task_completion_breakdown(
        &self,
        manager_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<TaskCompletionBreakdown> {
        let range = self.team_range(start, end)?;
        metrics::task_completion_breakdown(&self.db, manager_id, range, Utc::now()).await
    }

    pub async fn manager_dashboard(&self, manager_id: &str) -> Result<ManagerDashboardStats> {
        metrics::manager_dashboard_stats(&self.db, manager_id, Utc::now()).await
    }

    // ── Organization views ─────────────────────────────────────────

    /// `period` must be one of 7, 14, 30 or 90 and takes precedence over
    /// `start`.
    pub async fn organization_summary(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        period: Option<u32>,
    ) -> Result<OrganizationSummary> {
        let period = period.map(Lookback::from_days).transpose()?;
        let range = DateRange::with_lookback(
            start,
            end,
            period,
            self.config.org_default_days,
            Self::today(),
        )?;
        metrics::organization_summary(&self.db, range, period, Utc::now()).await
    }

    pub async fn department_analytics(
        &self,
        department: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DepartmentAnalytics> {
        let range =
            DateRange::resolve(start, end, self.config.org_default_days, Self::today())?;
        metrics::department_analytics(&self.db, department, range, Utc::now()).await
    }

    pub async fn hours_trend(&self, days: u32) -> Result<Vec<DailyHours>> {
        let period = Lookback::from_days(days)?;
        metrics::hours_trend(&self.db, period, Utc::now()).await
    }

    // ── Individual productivity ────────────────────────────────────

    /// Trailing-week snapshot, served from the cache while fresh.
    pub async fn productivity(&self, user_id: &str) -> Result<ProductivitySnapshot> {
        let now = Utc::now();
        if let Some(hit) = self.cache.get(user_id, now) {
            return Ok(hit);
        }
        log::info!("calculating productivity for {user_id}");
        let snapshot = metrics::productivity_snapshot(&self.db, user_id, now).await?;
        self.cache.insert(user_id, snapshot.clone(), now);
        Ok(snapshot)
    }

    pub async fn user_report(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ProductivityReport> {
        let range = self.team_range(start, end)?;
        metrics::user_report(&self.db, user_id, range, Utc::now()).await
    }

    pub async fn department_report(
        &self,
        department: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ProductivityReport> {
        let range = self.team_range(start, end)?;
        metrics::department_report(&self.db, department, range, Utc::now()).await
    }

    // ── Data and config commands ───────────────────────────────────

    pub async fn import(&self, path: impl AsRef<Path>) -> Result<ImportReport> {
        let bundle = RecordBundle::from_path(path).await?;
        let report = import::import_bundle(&self.db, bundle).await?;
        // Imported records may change any user's snapshot
        self.cache.clear();
        Ok(report)
    }

    pub async fn status(&self) -> Result<StoreCounts> {
        let counts = self
            .db
            .reader()
            .call(|conn| repository::store_counts(conn))
            .await?;
        Ok(counts)
    }

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        let value = self
            .db
            .reader()
            .call(move |conn| repository::get_config(conn, &key))
            .await?;
        Ok(value)
    }

    /// Values for known engine keys are validated before they are stored.
    /// They take effect the next time the engine is created.
    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        config::validate_entry(key, value)?;
        let key = key.to_string();
        let value = value.to_string();
        self.db
            .writer()
            .call(move |conn| repository::set_config(conn, &key, &value))
            .await?;
        Ok(())
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        let entries = self
            .db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn engine() -> TimeTrackAnalytics {
        let db = Database::open_memory().await.unwrap();
        TimeTrackAnalytics::new(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_invalid_group_by_rejected() {
        let analytics = engine().await;
        let err = analytics
            .team_hours_trend("m1", None, None, "month")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_invalid_period_rejected() {
        let analytics = engine().await;
        let err = analytics.organization_summary(None, None, Some(10)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(matches!(
            analytics.hours_trend(365).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let analytics = engine().await;
        let today = Utc::now().date_naive();
        let err = analytics
            .team_summary("m1", Some(today), Some(today - Duration::days(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_team_summary_default_range() {
        let analytics = engine().await;
        let summary = analytics.team_summary("m1", None, None).await.unwrap();
        assert_eq!(summary.calculated_to - summary.calculated_from, Duration::days(30));
    }

    #[tokio::test]
    async fn test_org_period_overrides_start() {
        let analytics = engine().await;
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let org = analytics
            .organization_summary(Some(start), Some(end), Some(30))
            .await
            .unwrap();
        assert_eq!(org.range.start, end - Duration::days(30));
        assert_eq!(org.period_range, "Last 30 days");

        let org = analytics
            .organization_summary(None, Some(end), None)
            .await
            .unwrap();
        assert_eq!(org.range.start, end - Duration::days(7));
    }

    #[tokio::test]
    async fn test_productivity_served_from_cache() {
        let analytics = engine().await;
        let first = analytics.productivity("u1").await.unwrap();
        let second = analytics.productivity("u1").await.unwrap();
        // Same document, including its generation time
        assert_eq!(first, second);
        assert_eq!(analytics.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_config_set_validates_known_keys() {
        let analytics = engine().await;
        assert!(matches!(
            analytics.config_set("cache_ttl_minutes", "never").await,
            Err(Error::Config(_))
        ));
        analytics.config_set("cache_ttl_minutes", "30").await.unwrap();
        assert_eq!(
            analytics.config_get("cache_ttl_minutes").await.unwrap(),
            Some("30".to_string())
        );

        let reloaded = TimeTrackAnalytics::new(analytics.db().clone()).await.unwrap();
        assert_eq!(reloaded.config().cache_ttl_minutes, 30);
    }

    #[tokio::test]
    async fn test_config_set_rejects_oversized_window() {
        let analytics = engine().await;
        assert!(matches!(
            analytics.config_set("default_range_days", "4000000000").await,
            Err(Error::Config(_))
        ));
        assert_eq!(analytics.config_get("default_range_days").await.unwrap(), None);

        // The largest accepted window still resolves to a valid range
        analytics.config_set("default_range_days", "36500").await.unwrap();
        let reloaded = TimeTrackAnalytics::new(analytics.db().clone()).await.unwrap();
        let range = reloaded.team_range(None, None).unwrap();
        assert_eq!(range.end - range.start, Duration::days(36_500));
    }

    #[tokio::test]
    async fn test_status_counts_empty_store() {
        let analytics = engine().await;
        let counts = analytics.status().await.unwrap();
        assert_eq!(counts.users, 0);
        assert!(counts.latest_entry.is_none());
    }
}
