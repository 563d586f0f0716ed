// Joint angle extraction
//
// Converts the left-side landmarks of one frame into knee, hip and back
// angles in degrees. Angles are recomputed every frame and never persisted.

use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::pose::landmarks::{LeftSideLandmarks, Point2};

/// Vertical-up direction in image coordinates (y grows downward)
const VERTICAL_UP: Point2 = Point2::new(0.0, -1.0);

/// Torso vectors shorter than this are treated as zero length
const MIN_TORSO_LENGTH: f64 = 1e-9;

/// Joint angles for one frame, degrees in [0, 180]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngleSample {
    pub knee_angle: f64,
    pub hip_angle: f64,
    pub back_angle: f64,
}

/// Angle at vertex `b` between rays `b→a` and `b→c`, in degrees.
///
/// Result is in [0, 180]. Depends only on ray directions, so it is invariant
/// under uniform positive scaling of all three points. Returns 0 when
/// `a == c`.
pub fn calculate_angle(a: Point2, b: Point2, c: Point2) -> f64 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// Angle between the torso vector `shoulder - hip` and vertical-up.
///
/// 0° is a perfectly upright torso; 90° is horizontal.
///
/// # Errors
/// `DegenerateGeometry` when shoulder and hip coincide, since the torso
/// direction is then undefined.
pub fn calculate_back_angle(shoulder: Point2, hip: Point2) -> Result<f64, PoseError> {
    let dx = shoulder.x - hip.x;
    let dy = shoulder.y - hip.y;
    let length = dx.hypot(dy);
    if length.is_nan() || length <= MIN_TORSO_LENGTH {
        return Err(PoseError::DegenerateGeometry {
            reason: format!(
                "zero-length torso vector (shoulder=({}, {}), hip=({}, {}))",
                shoulder.x, shoulder.y, hip.x, hip.y
            ),
        });
    }

    let cos_angle = (dx * VERTICAL_UP.x + dy * VERTICAL_UP.y) / length;
    Ok(cos_angle.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Stateless extractor turning validated landmarks into a [`JointAngleSample`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AngleExtractor;

impl AngleExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Compute knee (hip-knee-ankle), hip (shoulder-hip-knee) and back angles
    pub fn extract(&self, joints: &LeftSideLandmarks) -> Result<JointAngleSample, PoseError> {
        let knee_angle = calculate_angle(joints.hip, joints.knee, joints.ankle);
        let hip_angle = calculate_angle(joints.shoulder, joints.hip, joints.knee);
        let back_angle = calculate_back_angle(joints.shoulder, joints.hip)?;

        Ok(JointAngleSample {
            knee_angle,
            hip_angle,
            back_angle,
        })
    }
}
