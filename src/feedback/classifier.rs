// FeedbackClassifier - rule-based posture feedback
//
// Maps the current stage, back angle and rep count to one feedback
// category. Classification runs on every frame; whether the result is also
// announced is decided separately by the AnnouncementGate.
//
// Decision rules:
// 1. IF stage == Down AND back < MIN_BACK THEN LeanForward
// 2. ELSE IF stage == Down AND back > MAX_BACK THEN KeepBackUpright
// 3. ELSE IF stage == Down THEN GoodPosture
// 4. ELSE IF rep_count < learn_target THEN Calibrating
// 5. ELSE Encouragement

use serde::{Deserialize, Serialize};

use crate::calibration::{Stage, LEARN_TARGET};

/// Torso lean below which the user is told to lean forward (degrees)
pub const MIN_BACK_ANGLE: f64 = 20.0;

/// Torso lean above which the user is told to straighten up (degrees)
pub const MAX_BACK_ANGLE: f64 = 45.0;

/// Feedback categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    /// Down with the torso too upright
    LeanForward,
    /// Down with the torso leaning too far
    KeepBackUpright,
    /// Down with the torso inside the posture band
    GoodPosture,
    /// Not down, baseline still being learned
    Calibrating,
    /// Not down, counting against the learned baseline
    Encouragement,
}

impl FeedbackCategory {
    /// User-facing message for this category
    pub fn message(&self) -> &'static str {
        match self {
            FeedbackCategory::LeanForward => "Lean forward more",
            FeedbackCategory::KeepBackUpright => "Keep your back upright",
            FeedbackCategory::GoodPosture => "Good posture",
            FeedbackCategory::Calibrating => "Calibrating - do a slow, full squat",
            FeedbackCategory::Encouragement => "Great job, keep going!",
        }
    }

    /// Whether this category comments on posture (only emitted while Down)
    pub fn is_posture_cue(&self) -> bool {
        matches!(
            self,
            FeedbackCategory::LeanForward
                | FeedbackCategory::KeepBackUpright
                | FeedbackCategory::GoodPosture
        )
    }
}

/// Back-angle band considered good posture while Down
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureLimits {
    pub min_back_angle: f64,
    pub max_back_angle: f64,
}

impl Default for PostureLimits {
    fn default() -> Self {
        Self {
            min_back_angle: MIN_BACK_ANGLE,
            max_back_angle: MAX_BACK_ANGLE,
        }
    }
}

/// FeedbackClassifier applies the posture rules above
#[derive(Debug, Clone, Copy)]
pub struct FeedbackClassifier {
    limits: PostureLimits,
    learn_target: u32,
}

impl FeedbackClassifier {
    pub fn new(limits: PostureLimits, learn_target: u32) -> Self {
        Self {
            limits,
            learn_target,
        }
    }

    /// Classify one frame
    ///
    /// # Arguments
    /// * `stage` - Stage after the controller processed this frame
    /// * `back_angle` - Torso lean from vertical in degrees
    /// * `rep_count` - Rep count after this frame
    pub fn classify(&self, stage: Option<Stage>, back_angle: f64, rep_count: u32) -> FeedbackCategory {
        if stage == Some(Stage::Down) {
            if back_angle < self.limits.min_back_angle {
                FeedbackCategory::LeanForward
            } else if back_angle > self.limits.max_back_angle {
                FeedbackCategory::KeepBackUpright
            } else {
                FeedbackCategory::GoodPosture
            }
        } else if rep_count < self.learn_target {
            FeedbackCategory::Calibrating
        } else {
            FeedbackCategory::Encouragement
        }
    }
}

impl Default for FeedbackClassifier {
    fn default() -> Self {
        Self::new(PostureLimits::default(), LEARN_TARGET)
    }
}
