//! Start/stop state machine for focus sessions.
//!
//! Per user, the lifecycle is `NoSession -> Open -> Closed`; a closed session
//! is terminal and every new start creates a fresh session identity. The
//! tracker is the sole writer of session records.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::clock::Clock;
use crate::session::{Session, SessionDraft, SessionError};
use crate::store::{SessionStore, StoreError};
use crate::types::{SessionId, UserId, ValidationError};

/// Notification that a session was closed.
///
/// The tracker only knows this abstract hook, not the stats cache behind it,
/// which keeps the write path from depending on the read path.
pub trait SessionObserver: Send + Sync {
    /// Called after a close has been persisted, with the date the session is
    /// attributed to.
    fn session_closed(&self, user_id: &UserId, date: NaiveDate);
}

/// Errors from session lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// A start was requested while a session is already open. Carries the
    /// existing session's ID so callers can recover their timer state.
    #[error("user {user_id} already has active session {session_id}")]
    SessionAlreadyActive {
        user_id: UserId,
        session_id: SessionId,
    },

    /// A stop was requested with no open session.
    #[error("user {user_id} has no active session")]
    NoActiveSession { user_id: UserId },

    /// The stop time precedes the session's start time. The session stays
    /// open and unmodified.
    #[error("stop time {ended_at} is before start time {started_at}")]
    InvalidTimeRange {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },

    /// A concurrent writer won the race for the same user. Never retried
    /// here; only the caller knows whether a retry is safe.
    #[error("lost a concurrent session race for user {user_id}")]
    RaceLost { user_id: UserId },

    /// Invalid draft metadata.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store failed or timed out.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owns the per-user single-active-session state machine.
pub struct SessionTracker {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn SessionObserver>,
}

impl SessionTracker {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            store,
            clock,
            observer,
        }
    }

    /// Starts a new session for the user.
    ///
    /// If the user already has an open session, fails with
    /// [`TrackerError::SessionAlreadyActive`] carrying its ID; the existing
    /// session is not touched. Atomicity of the underlying insert means two
    /// concurrent starts cannot both succeed; the loser sees
    /// [`TrackerError::RaceLost`].
    pub fn start_session(
        &self,
        user_id: &UserId,
        draft: SessionDraft,
    ) -> Result<Session, TrackerError> {
        if let Some(existing) = self.store.find_open_session(user_id)? {
            return Err(TrackerError::SessionAlreadyActive {
                user_id: user_id.clone(),
                session_id: existing.id,
            });
        }

        let session = Session::open(user_id.clone(), draft.normalized()?, self.clock.now());
        match self.store.insert(session.clone()) {
            Ok(()) => {
                tracing::debug!(user_id = %user_id, session_id = %session.id, "session started");
                Ok(session)
            }
            Err(StoreError::OpenSessionExists { .. }) => Err(TrackerError::RaceLost {
                user_id: user_id.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Stops the user's open session.
    ///
    /// Computes the duration, persists the close, then notifies the observer
    /// for the session's attribution date. A stop time before the start time
    /// fails with [`TrackerError::InvalidTimeRange`] and leaves the session
    /// open; nothing is written in that case.
    pub fn stop_session(&self, user_id: &UserId) -> Result<Session, TrackerError> {
        let open = self
            .store
            .find_open_session(user_id)?
            .ok_or_else(|| TrackerError::NoActiveSession {
                user_id: user_id.clone(),
            })?;

        let now = self.clock.now();
        let closed = open.close(now).map_err(|err| match err {
            SessionError::EndsBeforeStart {
                started_at,
                ended_at,
            } => TrackerError::InvalidTimeRange {
                started_at,
                ended_at,
            },
            // The store only hands out open sessions; a concurrent stop must
            // have closed it between the read and here.
            SessionError::AlreadyClosed { .. } => TrackerError::RaceLost {
                user_id: user_id.clone(),
            },
        })?;

        match self
            .store
            .close(&closed.id, now, closed.duration_seconds.unwrap_or_default())
        {
            Ok(()) => {}
            Err(StoreError::AlreadyClosed { .. }) => {
                return Err(TrackerError::RaceLost {
                    user_id: user_id.clone(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        tracing::debug!(
            user_id = %user_id,
            session_id = %closed.id,
            duration_seconds = closed.duration_seconds,
            "session closed"
        );
        self.observer.session_closed(user_id, closed.start_date());
        Ok(closed)
    }

    /// Returns the user's open session without side effects.
    ///
    /// Used by clients to restore timer state after a reconnect; never
    /// invents state.
    pub fn get_active_session(&self, user_id: &UserId) -> Result<Option<Session>, TrackerError> {
        Ok(self.store.find_open_session(user_id)?)
    }
}
