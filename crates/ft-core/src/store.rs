//! Session store collaborator contract.
//!
//! The core consumes this trait and never implements a durable backend
//! itself; `ft-store-memory` provides an in-memory reference implementation.
//!
//! # Contract
//!
//! - `insert` is an atomic check-and-insert: it must fail with
//!   [`StoreError::OpenSessionExists`] when the user already has an open
//!   session, with no separate read-then-write window. This is what makes the
//!   single-active-session invariant hold under concurrent starts.
//! - `close` applies an end time and duration exactly once; a second close of
//!   the same session fails with [`StoreError::AlreadyClosed`].
//! - `query_closed_in_range` returns only closed sessions, in any order.
//! - Implementations are expected to bound their calls with their own
//!   timeouts and surface failures as [`StoreError::Unavailable`] rather than
//!   hanging; the core propagates that error without retrying.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::session::Session;
use crate::types::{SessionId, UserId};

/// Errors surfaced by a session store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An insert raced against an existing open session for the same user.
    #[error("user {user_id} already has an open session")]
    OpenSessionExists { user_id: UserId },

    /// An insert reused an existing session ID.
    #[error("session {id} already exists")]
    DuplicateId { id: SessionId },

    /// The referenced session does not exist.
    #[error("session {id} not found")]
    NotFound { id: SessionId },

    /// The referenced session was already closed by an earlier write.
    #[error("session {id} is already closed")]
    AlreadyClosed { id: SessionId },

    /// The backend failed or timed out.
    #[error("session store unavailable: {message}")]
    Unavailable { message: String },
}

/// Durable keyed storage of session records.
pub trait SessionStore: Send + Sync {
    /// Returns the user's open session, if any.
    fn find_open_session(&self, user_id: &UserId) -> Result<Option<Session>, StoreError>;

    /// Inserts a new session record.
    ///
    /// When the session is open, this atomically verifies that no other open
    /// session exists for the same user. Session IDs are unique: reusing one
    /// fails with [`StoreError::DuplicateId`] rather than overwriting the
    /// stored record.
    fn insert(&self, session: Session) -> Result<(), StoreError>;

    /// Closes an open session, recording its end time and duration.
    fn close(
        &self,
        id: &SessionId,
        ended_at: DateTime<Utc>,
        duration_seconds: u64,
    ) -> Result<(), StoreError>;

    /// Returns all closed sessions for the user whose start date falls within
    /// `from..=to` (UTC calendar dates). Order is unspecified.
    fn query_closed_in_range(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Session>, StoreError>;
}
