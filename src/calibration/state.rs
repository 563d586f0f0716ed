// CalibrationState - per-session rep counting state
//
// Holds the repetition count, the current movement stage, the running
// minimum knee angle of the open cycle, the minima observed while learning,
// and the personalized baseline learned from them.
//
// State is created per session, mutated once per frame by the
// CalibrationController, and only reset by an explicit caller request.

use serde::{Deserialize, Serialize};

use crate::calibration::controller::RepThresholds;

/// Transient movement classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Joint extended
    Up,
    /// Joint flexed
    Down,
}

/// Which half of the state machine a session is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPhase {
    /// Fewer than `learn_target` reps seen; baseline not yet known
    Learning,
    /// Baseline learned (or about to be); reps counted against it
    Counting,
}

impl CalibrationPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            CalibrationPhase::Learning => "LEARNING",
            CalibrationPhase::Counting => "COUNTING",
        }
    }
}

/// Rep counting state for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Completed repetitions
    pub rep_count: u32,
    /// Current stage; `None` until the first threshold crossing
    pub stage: Option<Stage>,
    /// Lowest knee angle seen in the open learning cycle
    pub tracked_min_angle: f64,
    /// Per-rep minima recorded while learning, in order
    pub observed_minima: Vec<f64>,
    /// Learned engage threshold; fixed once set until reset
    pub baseline_angle: Option<f64>,
}

impl CalibrationState {
    /// Create fresh state for the given thresholds
    ///
    /// `observed_minima` is pre-sized to `learn_target`; it never grows
    /// past that.
    pub fn new(thresholds: &RepThresholds) -> Self {
        Self {
            rep_count: 0,
            stage: None,
            tracked_min_angle: thresholds.recovery_angle,
            observed_minima: Vec::with_capacity(thresholds.learn_target as usize),
            baseline_angle: None,
        }
    }

    /// Create fresh state with the default thresholds (160/140, learn 2)
    pub fn new_default() -> Self {
        Self::new(&RepThresholds::default())
    }

    /// Phase implied by the rep count
    pub fn phase(&self, learn_target: u32) -> CalibrationPhase {
        if self.rep_count < learn_target {
            CalibrationPhase::Learning
        } else {
            CalibrationPhase::Counting
        }
    }

    /// Whether the baseline has been learned
    pub fn is_calibrated(&self) -> bool {
        self.baseline_angle.is_some()
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_default() {
        let state = CalibrationState::new_default();

        assert_eq!(state.rep_count, 0);
        assert_eq!(state.stage, None);
        assert_eq!(state.tracked_min_angle, 160.0);
        assert!(state.observed_minima.is_empty());
        assert_eq!(state.baseline_angle, None);
        assert!(!state.is_calibrated());
    }

    #[test]
    fn test_new_follows_recovery_threshold() {
        let thresholds = RepThresholds {
            recovery_angle: 150.0,
            engage_angle: 120.0,
            learn_target: 3,
        };
        let state = CalibrationState::new(&thresholds);
        assert_eq!(state.tracked_min_angle, 150.0);
        assert!(state.observed_minima.capacity() >= 3);
    }

    #[test]
    fn test_phase_boundary() {
        let mut state = CalibrationState::new_default();
        assert_eq!(state.phase(2), CalibrationPhase::Learning);

        state.rep_count = 1;
        assert_eq!(state.phase(2), CalibrationPhase::Learning);

        state.rep_count = 2;
        assert_eq!(state.phase(2), CalibrationPhase::Counting);
    }

    #[test]
    fn test_serialization_uses_null_stage() {
        let state = CalibrationState::new_default();
        let json = serde_json::to_value(&state).unwrap();
        assert!(json["stage"].is_null());
        assert!(json["baseline_angle"].is_null());

        let mut state = state;
        state.stage = Some(Stage::Down);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["stage"], "Down");
    }

    #[test]
    fn test_deserialization_round_trip_preserves_minima() {
        let json = r#"{
            "rep_count": 2,
            "stage": "Up",
            "tracked_min_angle": 160.0,
            "observed_minima": [135.0, 128.0],
            "baseline_angle": 131.5
        }"#;

        let state: CalibrationState = serde_json::from_str(json).unwrap();
        assert_eq!(state.observed_minima, vec![135.0, 128.0]);
        assert_eq!(state.baseline_angle, Some(131.5));
        assert_eq!(state.stage, Some(Stage::Up));
    }
}
