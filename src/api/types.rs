use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationState, Stage};
use crate::error::{ErrorCode, FrameError};
use crate::pose::JointAngleSample;

/// Round to two decimals for reporting
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-frame result returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub reps: u32,
    pub stage: Option<Stage>,
    /// Learned baseline; `null` while learning
    pub avg_angle: Option<f64>,
    pub knee_angle: f64,
    pub hip_angle: f64,
    pub back_angle: f64,
    pub feedback: String,
}

impl FrameReport {
    pub fn new(state: &CalibrationState, angles: &JointAngleSample, feedback: &str) -> Self {
        Self {
            reps: state.rep_count,
            stage: state.stage,
            avg_angle: state.baseline_angle.map(round2),
            knee_angle: round2(angles.knee_angle),
            hip_angle: round2(angles.hip_angle),
            back_angle: round2(angles.back_angle),
            feedback: feedback.to_string(),
        }
    }
}

/// Result of a session reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetReport {
    pub reps: u32,
    pub stage: Option<Stage>,
    pub avg_angle: Option<f64>,
}

impl ResetReport {
    pub fn new(state: &CalibrationState) -> Self {
        Self {
            reps: state.rep_count,
            stage: state.stage,
            avg_angle: state.baseline_angle,
        }
    }
}

/// Error body shared by the HTTP and CLI surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
    pub code: i32,
}

impl From<&FrameError> for ErrorReport {
    fn from(err: &FrameError) -> Self {
        Self {
            error: err.message(),
            code: err.code(),
        }
    }
}
