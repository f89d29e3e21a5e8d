//! Shared test doubles for the unit-test modules.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};

use crate::session::Session;
use crate::store::{SessionStore, StoreError};
use crate::types::{SessionId, UserId};

#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, Session>,
    open_by_user: HashMap<UserId, SessionId>,
}

/// Minimal in-memory [`SessionStore`] honoring the full store contract.
///
/// Lives in-crate so the unit-test modules do not need to link a second
/// store crate against this build of the library.
#[derive(Default)]
pub(crate) struct TestStore {
    inner: Mutex<Inner>,
}

impl TestStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for TestStore {
    fn find_open_session(&self, user_id: &UserId) -> Result<Option<Session>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .open_by_user
            .get(user_id)
            .and_then(|id| inner.sessions.get(id))
            .cloned())
    }

    fn insert(&self, session: Session) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.sessions.contains_key(&session.id) {
            return Err(StoreError::DuplicateId { id: session.id });
        }
        if session.is_open() {
            if inner.open_by_user.contains_key(&session.user_id) {
                return Err(StoreError::OpenSessionExists {
                    user_id: session.user_id,
                });
            }
            inner
                .open_by_user
                .insert(session.user_id.clone(), session.id.clone());
        }
        inner.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn close(
        &self,
        id: &SessionId,
        ended_at: DateTime<Utc>,
        duration_seconds: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        if session.is_closed() {
            return Err(StoreError::AlreadyClosed { id: id.clone() });
        }

        session.ended_at = Some(ended_at);
        session.duration_seconds = Some(duration_seconds);
        let user_id = session.user_id.clone();
        inner.open_by_user.remove(&user_id);
        Ok(())
    }

    fn query_closed_in_range(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Session>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .sessions
            .values()
            .filter(|s| {
                s.user_id == *user_id
                    && s.is_closed()
                    && (from..=to).contains(&s.start_date())
            })
            .cloned()
            .collect())
    }
}
