// Error types for the physio trainer engine
//
// This module defines custom error types for pose extraction and session
// handling, providing structured error handling with numeric error codes
// suitable for HTTP/CLI reporting.

mod pose;
mod session;

use std::fmt;

pub use pose::{log_pose_error, PoseError, PoseErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error payloads across
/// the HTTP and CLI surfaces.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;

    /// Get the taxonomy bucket this error belongs to
    fn category(&self) -> ErrorCategory;
}

/// Coarse classification of frame failures.
///
/// None of these are fatal to a long-running process; the caller decides
/// whether to resubmit the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// No usable landmarks for this frame (reposition and resubmit)
    Input,
    /// Degenerate geometry while computing angles
    Computation,
    /// Session bookkeeping failure
    State,
}

/// Any failure produced while handling a single frame or reset request.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    Pose(PoseError),
    Session(SessionError),
}

impl ErrorCode for FrameError {
    fn code(&self) -> i32 {
        match self {
            FrameError::Pose(err) => err.code(),
            FrameError::Session(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            FrameError::Pose(err) => err.message(),
            FrameError::Session(err) => err.message(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            FrameError::Pose(err) => err.category(),
            FrameError::Session(err) => err.category(),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Pose(err) => fmt::Display::fmt(err, f),
            FrameError::Session(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Pose(err) => Some(err),
            FrameError::Session(err) => Some(err),
        }
    }
}

impl From<PoseError> for FrameError {
    fn from(err: PoseError) -> Self {
        FrameError::Pose(err)
    }
}

impl From<SessionError> for FrameError {
    fn from(err: SessionError) -> Self {
        FrameError::Session(err)
    }
}
