// Pose module - landmark intake and joint angle extraction
//
// 1. LeftSideLandmarks::from_frame validates detector output
// 2. AngleExtractor::extract turns the joints into knee/hip/back angles

pub mod angles;
pub mod landmarks;

pub use angles::{calculate_angle, calculate_back_angle, AngleExtractor, JointAngleSample};
pub use landmarks::{LeftSideLandmarks, NamedLandmarks, Point2, PoseFrame, PoseLandmark};
