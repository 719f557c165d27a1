//! Process-lifetime cache of productivity snapshots, keyed by user id.
//!
//! Entries expire after a fixed TTL. There is no invalidation on writes to
//! the record store, so a snapshot may be up to one TTL stale. Concurrent
//! recomputation for the same user is allowed; the last insert wins.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::metrics::ProductivitySnapshot;

pub const DEFAULT_TTL_MINUTES: i64 = 5;

#[derive(Clone)]
pub struct ProductivityCache {
    entries: Arc<RwLock<HashMap<String, (ProductivitySnapshot, DateTime<Utc>)>>>,
    ttl: Duration,
}

impl Default for ProductivityCache {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_TTL_MINUTES))
    }
}

impl ProductivityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached snapshot for `user_id` if it was stored less than one TTL
    /// before `now`.
    pub fn get(&self, user_id: &str, now: DateTime<Utc>) -> Option<ProductivitySnapshot> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(user_id) {
            Some((snapshot, stored_at)) if now - *stored_at < self.ttl => {
                log::debug!("productivity cache hit for {user_id}");
                Some(snapshot.clone())
            }
            Some(_) => {
                log::debug!("productivity cache entry for {user_id} expired");
                None
            }
            None => {
                log::debug!("productivity cache miss for {user_id}");
                None
            }
        }
    }

    /// Store or replace the snapshot for `user_id`.
    pub fn insert(&self, user_id: &str, snapshot: ProductivitySnapshot, now: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Drop anything already expired while we hold the write lock
        let ttl = self.ttl;
        entries.retain(|_, (_, stored_at)| now - *stored_at < ttl);
        entries.insert(user_id.to_string(), (snapshot, now));
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
