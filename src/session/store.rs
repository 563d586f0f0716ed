// SessionStore - per-session state persistence contract
//
// The storage medium is up to the implementation (in-process map, external
// key-value store, client-held token). Implementations must keep state
// across single-frame calls for a session and isolate sessions from each
// other. Unknown ids are not an error: get_or_create lazily creates default
// state.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationState, RepThresholds};
use crate::error::{log_session_error, SessionError};
use crate::feedback::FeedbackState;

/// Everything a store keeps for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub calibration: CalibrationState,
    pub feedback: FeedbackState,
}

impl SessionState {
    pub fn new(thresholds: &RepThresholds) -> Self {
        Self {
            calibration: CalibrationState::new(thresholds),
            feedback: FeedbackState::default(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(&RepThresholds::default())
    }
}

/// Storage contract used by the session manager.
///
/// Callers serialize access per session id; stores only need to be safe
/// for concurrent calls on different ids.
pub trait SessionStore: Send + Sync {
    /// Fetch state for `session_id`, creating defaults if unknown
    fn get_or_create(&self, session_id: &str) -> Result<SessionState, SessionError>;

    /// Save state for `session_id` after a frame
    fn persist(&self, session_id: &str, state: SessionState) -> Result<(), SessionError>;

    /// Replace state for `session_id` with defaults and return them
    fn reset(&self, session_id: &str) -> Result<SessionState, SessionError>;

    /// Number of sessions currently held
    fn len(&self) -> Result<usize, SessionError>;

    fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.len()? == 0)
    }
}

/// In-process store over a `RwLock<HashMap>`
///
/// Grows by one entry per distinct session id. `reset` replaces the state
/// but keeps the entry; nothing is evicted.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
    thresholds: RepThresholds,
}

impl InMemorySessionStore {
    pub fn new(thresholds: RepThresholds) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            thresholds,
        }
    }

    fn check_id(session_id: &str) -> Result<(), SessionError> {
        if session_id.trim().is_empty() {
            let err = SessionError::InvalidSessionId;
            log_session_error(&err, "check_session_id");
            return Err(err);
        }
        Ok(())
    }

    fn poisoned(session_id: &str) -> SessionError {
        let err = SessionError::LockPoisoned {
            session_id: session_id.to_string(),
        };
        log_session_error(&err, "session_map");
        err
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(RepThresholds::default())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, session_id: &str) -> Result<SessionState, SessionError> {
        Self::check_id(session_id)?;

        {
            let sessions = self
                .sessions
                .read()
                .map_err(|_| Self::poisoned(session_id))?;
            if let Some(state) = sessions.get(session_id) {
                return Ok(state.clone());
            }
        }

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| Self::poisoned(session_id))?;
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                log::debug!("[SessionStore] Created session {}", session_id);
                SessionState::new(&self.thresholds)
            });
        Ok(state.clone())
    }

    fn persist(&self, session_id: &str, state: SessionState) -> Result<(), SessionError> {
        Self::check_id(session_id)?;

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| Self::poisoned(session_id))?;
        sessions.insert(session_id.to_string(), state);
        Ok(())
    }

    fn reset(&self, session_id: &str) -> Result<SessionState, SessionError> {
        Self::check_id(session_id)?;

        let fresh = SessionState::new(&self.thresholds);
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| Self::poisoned(session_id))?;
        sessions.insert(session_id.to_string(), fresh.clone());
        Ok(fresh)
    }

    fn len(&self) -> Result<usize, SessionError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| Self::poisoned("*"))?;
        Ok(sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Stage;

    #[test]
    fn test_unknown_session_created_with_defaults() {
        let store = InMemorySessionStore::default();
        let state = store.get_or_create("new-patient").unwrap();

        assert_eq!(state, SessionState::default());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_persist_then_get() {
        let store = InMemorySessionStore::default();
        let mut state = store.get_or_create("s1").unwrap();
        state.calibration.rep_count = 3;
        state.calibration.stage = Some(Stage::Down);
        store.persist("s1", state.clone()).unwrap();

        assert_eq!(store.get_or_create("s1").unwrap(), state);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::default();
        let mut a = store.get_or_create("a").unwrap();
        a.calibration.rep_count = 7;
        store.persist("a", a).unwrap();

        let b = store.get_or_create("b").unwrap();
        assert_eq!(b.calibration.rep_count, 0);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_reset_returns_defaults() {
        let store = InMemorySessionStore::default();
        let mut state = store.get_or_create("s1").unwrap();
        state.calibration.rep_count = 9;
        state.calibration.baseline_angle = Some(120.0);
        state.feedback.last_feedback = "Good posture".to_string();
        store.persist("s1", state).unwrap();

        let fresh = store.reset("s1").unwrap();
        assert_eq!(fresh, SessionState::default());
        assert_eq!(store.get_or_create("s1").unwrap(), SessionState::default());
    }

    #[test]
    fn test_reset_keeps_session_entry() {
        let store = InMemorySessionStore::default();
        store.get_or_create("s1").unwrap();
        store.get_or_create("s2").unwrap();

        store.reset("s1").unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_reset_unknown_session_creates_it() {
        let store = InMemorySessionStore::default();
        assert!(store.is_empty().unwrap());
        store.reset("never-seen").unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_empty_session_id_rejected() {
        let store = InMemorySessionStore::default();
        assert_eq!(
            store.get_or_create(""),
            Err(SessionError::InvalidSessionId)
        );
        assert_eq!(
            store.persist("  ", SessionState::default()),
            Err(SessionError::InvalidSessionId)
        );
        assert_eq!(store.reset(""), Err(SessionError::InvalidSessionId));
    }

    #[test]
    fn test_store_uses_configured_thresholds() {
        let store = InMemorySessionStore::new(RepThresholds {
            recovery_angle: 150.0,
            engage_angle: 130.0,
            learn_target: 3,
        });
        let state = store.get_or_create("s").unwrap();
        assert_eq!(state.calibration.tracked_min_angle, 150.0);
    }
}
