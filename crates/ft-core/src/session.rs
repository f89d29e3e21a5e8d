//! Session records and lifecycle rules.
//!
//! A [`Session`] is one focused-work interval. It is created open (no end
//! time) and transitions exactly once to closed; a closed session is never
//! modified again. The single-open-session-per-user invariant is enforced by
//! the store contract, not here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{SessionId, UserId, ValidationError};

/// Maximum length of a session title, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of session notes, in characters.
pub const MAX_NOTES_LENGTH: usize = 1000;

/// Maximum number of tags per session; extra tags are dropped.
pub const MAX_TAGS: usize = 10;

/// Lifecycle errors for a single session record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session was already closed.
    #[error("session {id} is already closed")]
    AlreadyClosed { id: SessionId },

    /// The requested end time precedes the start time (clock skew or bad input).
    #[error("end time {ended_at} is before start time {started_at}")]
    EndsBeforeStart {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
}

/// User-supplied metadata for a new session.
///
/// All fields are optional. [`SessionDraft::normalized`] applies the cleanup
/// rules before the draft is turned into a [`Session`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub title: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SessionDraft {
    /// Validates and normalizes the draft.
    ///
    /// Title and notes are trimmed; values that are empty after trimming
    /// become `None`. Tags are trimmed, lowercased, stripped of empties, and
    /// capped at [`MAX_TAGS`].
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let title = normalize_text(self.title, "title", MAX_TITLE_LENGTH)?;
        let notes = normalize_text(self.notes, "notes", MAX_NOTES_LENGTH)?;

        let mut tags: Vec<String> = self
            .tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        tags.truncate(MAX_TAGS);

        Ok(Self { title, notes, tags })
    }
}

/// Trim an optional text field, dropping it entirely when blank.
fn normalize_text(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.chars().count() > max {
                return Err(ValidationError::TooLong { field, max });
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// One focused-work interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    /// Optional short description of what the session was for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub started_at: DateTime<Utc>,
    /// `None` while the session is open.
    pub ended_at: Option<DateTime<Utc>>,
    /// Whole seconds between start and end; present iff the session is closed.
    pub duration_seconds: Option<u64>,
}

impl Session {
    /// Creates a new open session starting at `started_at`.
    ///
    /// The draft must already be normalized; see [`SessionDraft::normalized`].
    #[must_use]
    pub fn open(user_id: UserId, draft: SessionDraft, started_at: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            user_id,
            title: draft.title,
            notes: draft.notes,
            tags: draft.tags,
            started_at,
            ended_at: None,
            duration_seconds: None,
        }
    }

    /// Whether the session is still in progress.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Whether the session has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }

    /// The UTC calendar date the session is attributed to.
    ///
    /// Sessions are attributed wholly to the date of their start, even when
    /// they cross midnight.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.started_at.date_naive()
    }

    /// Seconds elapsed so far for an open session, or the stored duration for
    /// a closed one. Clamped at zero if `now` precedes the start.
    #[must_use]
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.duration_seconds.unwrap_or_else(|| {
            u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0)
        })
    }

    /// Returns a closed copy of this session ending at `ended_at`.
    ///
    /// Fails without producing a record if the session is already closed or if
    /// `ended_at` precedes `started_at`; the original is left untouched either
    /// way.
    pub fn close(&self, ended_at: DateTime<Utc>) -> Result<Self, SessionError> {
        if self.is_closed() {
            return Err(SessionError::AlreadyClosed {
                id: self.id.clone(),
            });
        }
        if ended_at < self.started_at {
            return Err(SessionError::EndsBeforeStart {
                started_at: self.started_at,
                ended_at,
            });
        }

        let duration = u64::try_from((ended_at - self.started_at).num_seconds()).unwrap_or(0);
        let mut closed = self.clone();
        closed.ended_at = Some(ended_at);
        closed.duration_seconds = Some(duration);
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 24, h, m, s).unwrap()
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn test_open_session_has_no_end() {
        let session = Session::open(user(), SessionDraft::default(), ts(9, 0, 0));
        assert!(session.is_open());
        assert!(!session.is_closed());
        assert!(session.ended_at.is_none());
        assert!(session.duration_seconds.is_none());
    }

    #[test]
    fn test_close_computes_whole_seconds() {
        let session = Session::open(user(), SessionDraft::default(), ts(9, 0, 0));
        let closed = session.close(ts(9, 25, 0)).unwrap();

        assert!(closed.is_closed());
        assert_eq!(closed.duration_seconds, Some(1500));
        assert_eq!(closed.ended_at, Some(ts(9, 25, 0)));
        // Original is untouched
        assert!(session.is_open());
    }

    #[test]
    fn test_close_zero_duration_is_valid() {
        let session = Session::open(user(), SessionDraft::default(), ts(9, 0, 0));
        let closed = session.close(ts(9, 0, 0)).unwrap();
        assert_eq!(closed.duration_seconds, Some(0));
    }

    #[test]
    fn test_close_before_start_fails() {
        let session = Session::open(user(), SessionDraft::default(), ts(9, 0, 0));
        let result = session.close(ts(8, 59, 59));

        assert!(matches!(
            result,
            Err(SessionError::EndsBeforeStart { .. })
        ));
        assert!(session.is_open());
    }

    #[test]
    fn test_close_twice_fails() {
        let session = Session::open(user(), SessionDraft::default(), ts(9, 0, 0));
        let closed = session.close(ts(9, 10, 0)).unwrap();
        let result = closed.close(ts(9, 20, 0));

        assert!(matches!(result, Err(SessionError::AlreadyClosed { .. })));
        // First close stands
        assert_eq!(closed.duration_seconds, Some(600));
    }

    #[test]
    fn test_start_date_is_utc_date_of_start() {
        let session = Session::open(
            user(),
            SessionDraft::default(),
            Utc.with_ymd_and_hms(2025, 9, 24, 23, 50, 0).unwrap(),
        );
        // Crosses midnight; still attributed to the start date
        let closed = session
            .close(Utc.with_ymd_and_hms(2025, 9, 25, 0, 20, 0).unwrap())
            .unwrap();
        assert_eq!(
            closed.start_date(),
            NaiveDate::from_ymd_opt(2025, 9, 24).unwrap()
        );
        assert_eq!(closed.duration_seconds, Some(1800));
    }

    #[test]
    fn test_elapsed_seconds_for_open_session() {
        let session = Session::open(user(), SessionDraft::default(), ts(9, 0, 0));
        assert_eq!(session.elapsed_seconds(ts(9, 5, 30)), 330);
        // Clock behind the start clamps to zero
        assert_eq!(session.elapsed_seconds(ts(8, 0, 0)), 0);
    }

    #[test]
    fn test_elapsed_seconds_for_closed_session_uses_stored_duration() {
        let session = Session::open(user(), SessionDraft::default(), ts(9, 0, 0));
        let closed = session.close(ts(9, 25, 0)).unwrap();
        // `now` is ignored once a duration is stored
        assert_eq!(closed.elapsed_seconds(ts(12, 0, 0)), 1500);
    }

    #[test]
    fn test_draft_normalizes_title_and_notes() {
        let draft = SessionDraft {
            title: Some("  Morning focus  ".to_string()),
            notes: Some("   ".to_string()),
            tags: vec![],
        };
        let normalized = draft.normalized().unwrap();
        assert_eq!(normalized.title.as_deref(), Some("Morning focus"));
        assert!(normalized.notes.is_none());
    }

    #[test]
    fn test_draft_rejects_oversized_title() {
        let draft = SessionDraft {
            title: Some("x".repeat(MAX_TITLE_LENGTH + 1)),
            notes: None,
            tags: vec![],
        };
        assert!(matches!(
            draft.normalized(),
            Err(ValidationError::TooLong { field: "title", .. })
        ));
    }

    #[test]
    fn test_draft_cleans_and_caps_tags() {
        let draft = SessionDraft {
            title: None,
            notes: None,
            tags: (0..15)
                .map(|i| format!("  Tag-{i} "))
                .chain(["".to_string(), "   ".to_string()])
                .collect(),
        };
        let normalized = draft.normalized().unwrap();
        assert_eq!(normalized.tags.len(), MAX_TAGS);
        assert_eq!(normalized.tags[0], "tag-0");
    }

    #[test]
    fn test_session_serde_roundtrip() {
        let session = Session::open(
            user(),
            SessionDraft {
                title: Some("docs".to_string()),
                notes: None,
                tags: vec!["work".to_string()],
            },
            ts(9, 0, 0),
        );
        let json = serde_json::to_string(&session).unwrap();
        let parsed: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, session);
    }
}
