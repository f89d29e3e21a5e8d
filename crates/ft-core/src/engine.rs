//! Engine wiring.
//!
//! [`FocusEngine`] assembles the tracker, aggregator, and invalidator around
//! a store and a clock, and exposes the five entry points an outer layer
//! (HTTP, CLI, UI binding) consumes.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::invalidate::CacheInvalidator;
use crate::session::{Session, SessionDraft};
use crate::stats::{DailyStat, StatsAggregator, StatsError, TrendWindow};
use crate::store::SessionStore;
use crate::tracker::{SessionTracker, TrackerError};
use crate::types::UserId;

/// The assembled focus-tracking engine.
pub struct FocusEngine {
    tracker: SessionTracker,
    stats: Arc<StatsAggregator>,
    config: EngineConfig,
}

impl FocusEngine {
    /// Builds an engine around the given store and clock.
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let stats = Arc::new(StatsAggregator::new(Arc::clone(&store)));
        let invalidator = Arc::new(CacheInvalidator::new(Arc::clone(&stats)));
        let tracker = SessionTracker::new(store, clock, invalidator);
        tracing::debug!(?config, "engine assembled");
        Self {
            tracker,
            stats,
            config,
        }
    }

    /// Builds an engine that reads wall-clock time.
    pub fn with_system_clock(store: Arc<dyn SessionStore>, config: EngineConfig) -> Self {
        Self::new(store, Arc::new(SystemClock), config)
    }

    /// Starts a session for the user. See [`SessionTracker::start_session`].
    pub fn start_session(
        &self,
        user_id: &UserId,
        draft: SessionDraft,
    ) -> Result<Session, TrackerError> {
        self.tracker.start_session(user_id, draft)
    }

    /// Stops the user's open session. See [`SessionTracker::stop_session`].
    pub fn stop_session(&self, user_id: &UserId) -> Result<Session, TrackerError> {
        self.tracker.stop_session(user_id)
    }

    /// Returns the user's open session, if any.
    pub fn get_active_session(&self, user_id: &UserId) -> Result<Option<Session>, TrackerError> {
        self.tracker.get_active_session(user_id)
    }

    /// Returns the daily aggregate for `(user, date)`.
    pub fn daily_stat(&self, user_id: &UserId, date: NaiveDate) -> Result<DailyStat, StatsError> {
        self.stats.daily_stat(user_id, date)
    }

    /// Returns a trend window of the configured default length.
    pub fn trend(
        &self,
        user_id: &UserId,
        reference_date: NaiveDate,
    ) -> Result<TrendWindow, StatsError> {
        self.trend_with_days(user_id, self.config.default_trend_days, reference_date)
    }

    /// Returns a trend window of an explicit length.
    pub fn trend_with_days(
        &self,
        user_id: &UserId,
        days: u32,
        reference_date: NaiveDate,
    ) -> Result<TrendWindow, StatsError> {
        self.stats.trend(user_id, days, reference_date)
    }

    /// Fraction of the configured daily goal reached by a daily stat.
    #[must_use]
    pub fn goal_progress(&self, stat: &DailyStat) -> f64 {
        stat.goal_progress(self.config.daily_goal_minutes)
    }

    /// The engine's configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}
