//! Daily and trend statistics over closed sessions.
//!
//! Aggregates are derived data: the store remains the source of truth and
//! every cached value can be rebuilt from it at any time. The cache is keyed
//! by `(user, date)`; trend windows are composed on read from per-day entries
//! rather than cached whole, so a single-date invalidation is always
//! complete.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Session;
use crate::store::{SessionStore, StoreError};
use crate::types::UserId;

/// Errors from statistics queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// A trend window must cover at least one day and stay within
    /// representable dates.
    #[error("invalid trend window of {days} days")]
    InvalidTrendDays { days: u32 },

    /// The store failed or timed out.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Aggregate of closed-session time for one user and one UTC calendar date.
///
/// The current day's value is provisional: open sessions contribute nothing
/// until they are stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total_seconds: u64,
    pub session_count: u32,
}

impl DailyStat {
    /// A zero-valued entry for a day with no closed sessions.
    #[must_use]
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_seconds: 0,
            session_count: 0,
        }
    }

    /// Fraction of a daily goal reached, e.g. `1.0` when the goal is met.
    /// May exceed `1.0`; callers decide how to render overshoot.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "realistic daily totals are far below 2^52 seconds"
    )]
    pub fn goal_progress(&self, goal_minutes: u32) -> f64 {
        let goal_seconds = u64::from(goal_minutes) * 60;
        if goal_seconds == 0 {
            return 0.0;
        }
        self.total_seconds as f64 / goal_seconds as f64
    }
}

/// An ordered run of consecutive daily stats ending at a reference date.
///
/// Always contains exactly the requested number of entries, zero-filled for
/// days without sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendWindow {
    pub entries: Vec<DailyStat>,
}

impl TrendWindow {
    /// Sum of all daily totals in the window.
    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, stat| acc.saturating_add(stat.total_seconds))
    }

    /// First and last dates covered, if the window is non-empty.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.entries.first()?.date, self.entries.last()?.date))
    }
}

type CacheKey = (UserId, NaiveDate);

/// Derives statistics from session records, with an invalidate-on-write
/// cache.
///
/// The cache is a pure performance layer: dropping it at any point loses
/// nothing but speed.
pub struct StatsAggregator {
    store: Arc<dyn SessionStore>,
    cache: RwLock<HashMap<CacheKey, DailyStat>>,
    /// Bumped by [`invalidate`] before each eviction. A recompute snapshots
    /// this before its store read and only fills the cache if it is still
    /// unchanged, so an invalidation always wins over an in-flight recompute.
    ///
    /// [`invalidate`]: StatsAggregator::invalidate
    invalidations: AtomicU64,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Returns the daily aggregate for `(user, date)`, from cache when
    /// possible.
    pub fn daily_stat(&self, user_id: &UserId, date: NaiveDate) -> Result<DailyStat, StatsError> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(stat) = cache.get(&(user_id.clone(), date)) {
                tracing::trace!(user_id = %user_id, %date, "daily stat cache hit");
                return Ok(*stat);
            }
        }

        let generation = self.invalidations.load(Ordering::Acquire);
        let sessions = self.store.query_closed_in_range(user_id, date, date)?;
        let stat = aggregate_day(date, &sessions);
        tracing::debug!(
            user_id = %user_id,
            %date,
            total_seconds = stat.total_seconds,
            session_count = stat.session_count,
            "daily stat recomputed"
        );

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // An eviction since our store read means `stat` may predate a write.
        // Return it (it was accurate when computed) but do not cache it.
        if self.invalidations.load(Ordering::Acquire) == generation {
            cache.insert((user_id.clone(), date), stat);
        } else {
            tracing::trace!(user_id = %user_id, %date, "skipped caching stale recompute");
        }
        Ok(stat)
    }

    /// Returns `days` consecutive daily stats ending at `reference_date`
    /// inclusive, oldest first, with zero-filled entries for empty days.
    pub fn trend(
        &self,
        user_id: &UserId,
        days: u32,
        reference_date: NaiveDate,
    ) -> Result<TrendWindow, StatsError> {
        if days == 0 {
            return Err(StatsError::InvalidTrendDays { days });
        }
        let start = reference_date
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or(StatsError::InvalidTrendDays { days })?;

        let mut entries = Vec::with_capacity(days as usize);
        for date in start.iter_days().take(days as usize) {
            entries.push(self.daily_stat(user_id, date)?);
        }
        Ok(TrendWindow { entries })
    }

    /// Drops the cached aggregate for `(user, date)` so the next read
    /// recomputes it from the store.
    pub fn invalidate(&self, user_id: &UserId, date: NaiveDate) {
        // Bump before evicting: a recompute that read the store earlier sees
        // the new generation under the write lock and declines to cache.
        self.invalidations.fetch_add(1, Ordering::AcqRel);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.remove(&(user_id.clone(), date)).is_some() {
            tracing::debug!(user_id = %user_id, %date, "evicted cached daily stat");
        }
    }
}

/// Sums closed sessions attributed to `date`.
///
/// Open sessions and sessions attributed to other dates contribute nothing.
/// The accumulator is 64-bit and saturates instead of wrapping.
fn aggregate_day(date: NaiveDate, sessions: &[Session]) -> DailyStat {
    let mut total_seconds = 0u64;
    let mut session_count = 0u32;

    for session in sessions {
        if !session.is_closed() || session.start_date() != date {
            continue;
        }
        total_seconds = total_seconds.saturating_add(session.duration_seconds.unwrap_or_default());
        session_count = session_count.saturating_add(1);
    }

    DailyStat {
        date,
        total_seconds,
        session_count,
    }
}
