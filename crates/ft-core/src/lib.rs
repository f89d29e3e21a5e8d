//! Core engine for the focus tracker.
//!
//! This crate contains the session lifecycle and statistics machinery:
//! - Tracker: start/stop state machine with the single-active-session invariant
//! - Stats: daily and trend aggregation with an invalidate-on-write cache
//! - Store: the collaborator contract persistence backends implement
//! - Clock: injectable time source for deterministic tests
//!
//! Transport, authentication, and durable storage live outside this crate
//! and talk to it only through [`FocusEngine`] and [`SessionStore`].

pub mod clock;
pub mod config;
mod engine;
mod invalidate;
pub mod session;
pub mod stats;
pub mod store;
#[cfg(test)]
mod testutil;
pub mod tracker;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::FocusEngine;
pub use invalidate::CacheInvalidator;
pub use session::{Session, SessionDraft, SessionError};
pub use stats::{DailyStat, StatsAggregator, StatsError, TrendWindow};
pub use store::{SessionStore, StoreError};
pub use tracker::{SessionObserver, SessionTracker, TrackerError};
pub use types::{SessionId, UserId, ValidationError};
