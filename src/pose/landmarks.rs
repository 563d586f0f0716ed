// Landmark types - normalized image-plane coordinates from the pose detector
//
// The detector (MediaPipe Pose or equivalent) is an external collaborator.
// It delivers 33 landmarks per frame in a fixed index order; only the four
// left-side joints below feed the angle computation.

use serde::{Deserialize, Serialize};

use crate::error::PoseError;

/// A single 2-D landmark in normalized image coordinates.
///
/// `x` grows to the right and `y` grows downward, both nominally in [0, 1].
/// Extra detector fields (`z`, `visibility`) are ignored on input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Landmarks consumed by the angle extractor, with their detector indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoseLandmark {
    LeftShoulder,
    LeftHip,
    LeftKnee,
    LeftAnkle,
}

impl PoseLandmark {
    /// Position in the detector's 33-landmark list
    pub const fn index(self) -> usize {
        match self {
            PoseLandmark::LeftShoulder => 11,
            PoseLandmark::LeftHip => 23,
            PoseLandmark::LeftKnee => 25,
            PoseLandmark::LeftAnkle => 27,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PoseLandmark::LeftShoulder => "LEFT_SHOULDER",
            PoseLandmark::LeftHip => "LEFT_HIP",
            PoseLandmark::LeftKnee => "LEFT_KNEE",
            PoseLandmark::LeftAnkle => "LEFT_ANKLE",
        }
    }
}

/// One frame of detector output.
///
/// Accepts either the detector's full indexed list or the four required
/// joints by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoseFrame {
    Indexed { landmarks: Vec<Point2> },
    Named(NamedLandmarks),
}

impl PoseFrame {
    /// Frame with no detected pose
    pub fn empty() -> Self {
        PoseFrame::Indexed {
            landmarks: Vec::new(),
        }
    }
}

/// Named form of a frame; any joint may be absent.
///
/// Unknown keys are rejected so a malformed payload fails to parse instead
/// of reading as a frame with no pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedLandmarks {
    #[serde(default)]
    pub left_shoulder: Option<Point2>,
    #[serde(default)]
    pub left_hip: Option<Point2>,
    #[serde(default)]
    pub left_knee: Option<Point2>,
    #[serde(default)]
    pub left_ankle: Option<Point2>,
}

/// The validated left-side joints of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeftSideLandmarks {
    pub shoulder: Point2,
    pub hip: Point2,
    pub knee: Point2,
    pub ankle: Point2,
}

impl LeftSideLandmarks {
    /// Pull the four required joints out of a detector frame
    ///
    /// # Errors
    /// - `NoPoseDetected` when the frame carries no landmarks at all
    /// - `MissingLandmark` when a required joint is absent
    /// - `InvalidCoordinate` when a required joint is NaN/infinite
    pub fn from_frame(frame: &PoseFrame) -> Result<Self, PoseError> {
        match frame {
            PoseFrame::Indexed { landmarks } => {
                if landmarks.is_empty() {
                    return Err(PoseError::NoPoseDetected);
                }
                let pick = |landmark: PoseLandmark| {
                    landmarks.get(landmark.index()).copied()
                };
                Self::assemble(
                    pick(PoseLandmark::LeftShoulder),
                    pick(PoseLandmark::LeftHip),
                    pick(PoseLandmark::LeftKnee),
                    pick(PoseLandmark::LeftAnkle),
                )
            }
            PoseFrame::Named(named) => {
                if named.left_shoulder.is_none()
                    && named.left_hip.is_none()
                    && named.left_knee.is_none()
                    && named.left_ankle.is_none()
                {
                    return Err(PoseError::NoPoseDetected);
                }
                Self::assemble(
                    named.left_shoulder,
                    named.left_hip,
                    named.left_knee,
                    named.left_ankle,
                )
            }
        }
    }

    fn assemble(
        shoulder: Option<Point2>,
        hip: Option<Point2>,
        knee: Option<Point2>,
        ankle: Option<Point2>,
    ) -> Result<Self, PoseError> {
        Ok(Self {
            shoulder: require(PoseLandmark::LeftShoulder, shoulder)?,
            hip: require(PoseLandmark::LeftHip, hip)?,
            knee: require(PoseLandmark::LeftKnee, knee)?,
            ankle: require(PoseLandmark::LeftAnkle, ankle)?,
        })
    }
}

fn require(landmark: PoseLandmark, point: Option<Point2>) -> Result<Point2, PoseError> {
    let point = point.ok_or(PoseError::MissingLandmark {
        landmark: landmark.name(),
    })?;
    if !point.is_finite() {
        return Err(PoseError::InvalidCoordinate {
            landmark: landmark.name(),
        });
    }
    Ok(point)
}
