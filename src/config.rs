use chrono::Duration;

use crate::error::{Error, Result};
use crate::storage::{repository, Database};

pub const CACHE_TTL_MINUTES: &str = "cache_ttl_minutes";
pub const DEFAULT_RANGE_DAYS: &str = "default_range_days";
pub const ORG_DEFAULT_DAYS: &str = "org_default_days";

/// Upper bound for every engine setting (roughly a century of days).
pub const MAX_VALUE: u32 = 36_500;

/// Keys read by [`EngineConfig::load`].
pub const KNOWN_KEYS: [&str; 3] = [CACHE_TTL_MINUTES, DEFAULT_RANGE_DAYS, ORG_DEFAULT_DAYS];

/// Engine settings stored in the `app_config` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub cache_ttl_minutes: u32,
    /// Trailing window for team views when no start date is given.
    pub default_range_days: u32,
    /// Window for organization and department views with no period or start.
    pub org_default_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 5,
            default_range_days: 30,
            org_default_days: 7,
        }
    }
}

impl EngineConfig {
    pub async fn load(db: &Database) -> Result<Self> {
        let stored = db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await?;

        let mut config = Self::default();
        for (key, value) in stored {
            match key.as_str() {
                CACHE_TTL_MINUTES => config.cache_ttl_minutes = parse_positive(&key, &value)?,
                DEFAULT_RANGE_DAYS => config.default_range_days = parse_positive(&key, &value)?,
                ORG_DEFAULT_DAYS => config.org_default_days = parse_positive(&key, &value)?,
                other => log::debug!("ignoring config key {other}"),
            }
        }
        log::debug!("loaded engine config: {config:?}");
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::minutes(self.cache_ttl_minutes as i64)
    }
}

/// Check a value before it is written for one of the [`KNOWN_KEYS`].
/// Unknown keys are accepted as-is.
pub fn validate_entry(key: &str, value: &str) -> Result<()> {
    if KNOWN_KEYS.contains(&key) {
        parse_positive(key, value)?;
    }
    Ok(())
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 && n <= MAX_VALUE => Ok(n),
        _ => Err(Error::Config(format!(
            "{key} must be a whole number between 1 and {MAX_VALUE}, got '{value}'"
        ))),
    }
}
