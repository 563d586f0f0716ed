// Session store error types and constants

use crate::error::{ErrorCategory, ErrorCode};
use log::error;
use std::fmt;

/// Session error code constants
///
/// Error code range: 4001-4003
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// Session id is empty or otherwise unusable as a key
    pub const INVALID_SESSION_ID: i32 = 4001;

    /// A session lock was poisoned by a panicking writer
    pub const LOCK_POISONED: i32 = 4002;

    /// Backing store could not be reached
    pub const STORE_UNAVAILABLE: i32 = 4003;
}

/// Log a session error with structured context
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=SessionStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Session bookkeeping errors
///
/// An unknown session id is not an error: stores lazily create default
/// state for it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Session id was empty
    InvalidSessionId,

    /// Lock guarding a session (or the session map) was poisoned
    LockPoisoned { session_id: String },

    /// External store failed
    StoreUnavailable { reason: String },
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::InvalidSessionId => SessionErrorCodes::INVALID_SESSION_ID,
            SessionError::LockPoisoned { .. } => SessionErrorCodes::LOCK_POISONED,
            SessionError::StoreUnavailable { .. } => SessionErrorCodes::STORE_UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::InvalidSessionId => "Session id must not be empty".to_string(),
            SessionError::LockPoisoned { session_id } => {
                format!("Session lock poisoned for session: {}", session_id)
            }
            SessionError::StoreUnavailable { reason } => {
                format!("Session store unavailable: {}", reason)
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::State
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_codes() {
        assert_eq!(SessionError::InvalidSessionId.code(), 4001);
        assert_eq!(
            SessionError::LockPoisoned {
                session_id: "s".to_string()
            }
            .code(),
            4002
        );
        assert_eq!(
            SessionError::StoreUnavailable {
                reason: "down".to_string()
            }
            .code(),
            4003
        );
    }

    #[test]
    fn test_session_error_messages() {
        let err = SessionError::LockPoisoned {
            session_id: "patient-7".to_string(),
        };
        assert!(err.message().contains("patient-7"));

        let err = SessionError::StoreUnavailable {
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.message(),
            "Session store unavailable: connection refused"
        );
    }
}
