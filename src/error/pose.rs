// Pose extraction error types and constants

use crate::error::{ErrorCategory, ErrorCode};
use log::warn;
use std::fmt;

/// Pose error code constants
///
/// Error code range: 3001-3003 (input), 3101 (computation)
pub struct PoseErrorCodes {}

impl PoseErrorCodes {
    /// Detector returned no landmarks for this frame
    pub const NO_POSE_DETECTED: i32 = 3001;

    /// A required landmark is absent from the frame
    pub const MISSING_LANDMARK: i32 = 3002;

    /// A required landmark has a non-finite coordinate
    pub const INVALID_COORDINATE: i32 = 3003;

    /// Angle is undefined for the supplied geometry
    pub const DEGENERATE_GEOMETRY: i32 = 3101;
}

/// Log a pose error with structured context
///
/// Pose errors are expected during normal operation (user stepped out of
/// frame), so they are logged at warn level.
pub fn log_pose_error(err: &PoseError, context: &str) {
    warn!(
        "Pose error in {}: code={}, component=AngleExtractor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while turning landmarks into joint angles
#[derive(Debug, Clone, PartialEq)]
pub enum PoseError {
    /// No pose landmarks available for this frame
    NoPoseDetected,

    /// Frame does not contain a landmark the angle computation needs
    MissingLandmark { landmark: &'static str },

    /// Landmark coordinate is NaN or infinite
    InvalidCoordinate { landmark: &'static str },

    /// Degenerate geometry, e.g. shoulder and hip at the same point
    DegenerateGeometry { reason: String },
}

impl ErrorCode for PoseError {
    fn code(&self) -> i32 {
        match self {
            PoseError::NoPoseDetected => PoseErrorCodes::NO_POSE_DETECTED,
            PoseError::MissingLandmark { .. } => PoseErrorCodes::MISSING_LANDMARK,
            PoseError::InvalidCoordinate { .. } => PoseErrorCodes::INVALID_COORDINATE,
            PoseError::DegenerateGeometry { .. } => PoseErrorCodes::DEGENERATE_GEOMETRY,
        }
    }

    fn message(&self) -> String {
        match self {
            PoseError::NoPoseDetected => "No pose detected".to_string(),
            PoseError::MissingLandmark { landmark } => {
                format!("Missing landmark: {}", landmark)
            }
            PoseError::InvalidCoordinate { landmark } => {
                format!("Invalid coordinate for landmark {}", landmark)
            }
            PoseError::DegenerateGeometry { reason } => {
                format!("Failed to calculate angles: {}", reason)
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            PoseError::DegenerateGeometry { .. } => ErrorCategory::Computation,
            _ => ErrorCategory::Input,
        }
    }
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PoseError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PoseError {}
