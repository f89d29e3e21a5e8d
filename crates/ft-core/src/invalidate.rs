//! Cache invalidation coordinator.
//!
//! Sits between the tracker's "session closed" notification and the stats
//! cache so the two never depend on each other directly.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::stats::StatsAggregator;
use crate::tracker::SessionObserver;
use crate::types::UserId;

/// Evicts stale aggregates when a session is closed.
///
/// Opening a session never changes a day's completed total, so only closes
/// trigger eviction, and only for the single date the session is attributed
/// to.
pub struct CacheInvalidator {
    stats: Arc<StatsAggregator>,
}

impl CacheInvalidator {
    pub fn new(stats: Arc<StatsAggregator>) -> Self {
        Self { stats }
    }
}

impl SessionObserver for CacheInvalidator {
    fn session_closed(&self, user_id: &UserId, date: NaiveDate) {
        self.stats.invalidate(user_id, date);
    }
}
