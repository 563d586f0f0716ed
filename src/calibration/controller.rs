// CalibrationController - two-phase rep counting state machine
//
// Absolute knee-angle thresholds vary with camera perspective and body
// proportions, so the first `learn_target` reps calibrate a personalized
// engage threshold from the user's own per-rep minima. Later reps are
// detected against that learned baseline instead of the fixed constant.
//
// Learning (rep_count < learn_target):
//   knee > recovery -> close rep if Down, then stage = Up
//   knee < engage   -> stage = Down, track minimum
// Counting (rep_count >= learn_target):
//   knee > recovery                  -> stage = Up
//   knee < baseline and stage == Up  -> stage = Down, rep_count += 1

use serde::{Deserialize, Serialize};

use crate::calibration::state::{CalibrationPhase, CalibrationState, Stage};

/// Knee angle above which the joint counts as recovered (extended)
pub const RECOVERY_THRESHOLD_ANGLE: f64 = 160.0;

/// Knee angle below which the joint counts as engaged (flexed) while learning
pub const ENGAGE_THRESHOLD_ANGLE: f64 = 140.0;

/// Reps used to learn the baseline
pub const LEARN_TARGET: u32 = 2;

/// Thresholds driving the controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepThresholds {
    pub recovery_angle: f64,
    pub engage_angle: f64,
    pub learn_target: u32,
}

impl Default for RepThresholds {
    fn default() -> Self {
        Self {
            recovery_angle: RECOVERY_THRESHOLD_ANGLE,
            engage_angle: ENGAGE_THRESHOLD_ANGLE,
            learn_target: LEARN_TARGET,
        }
    }
}

/// Result of feeding one knee angle to the controller
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerStep {
    /// State after the frame
    pub state: CalibrationState,
    /// Reps completed on this frame (0 or 1)
    pub reps_added: u32,
    /// Baseline learned on this frame, if the machine just entered Counting
    pub baseline_learned: Option<f64>,
}

/// Stateless driver of [`CalibrationState`] transitions
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibrationController {
    thresholds: RepThresholds,
}

impl CalibrationController {
    pub fn new(thresholds: RepThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RepThresholds {
        &self.thresholds
    }

    /// Fresh state for a new or reset session
    pub fn initial_state(&self) -> CalibrationState {
        CalibrationState::new(&self.thresholds)
    }

    /// Reinitialize state to defaults from any phase
    pub fn reset(&self) -> CalibrationState {
        self.initial_state()
    }

    /// Phase of `state` under these thresholds
    pub fn phase(&self, state: &CalibrationState) -> CalibrationPhase {
        state.phase(self.thresholds.learn_target)
    }

    /// Apply one frame's knee angle
    ///
    /// Non-finite angles leave the state untouched.
    pub fn advance(&self, mut state: CalibrationState, knee_angle: f64) -> ControllerStep {
        if !knee_angle.is_finite() {
            return ControllerStep {
                state,
                reps_added: 0,
                baseline_learned: None,
            };
        }

        let reps_before = state.rep_count;
        let mut baseline_learned = None;

        match self.phase(&state) {
            CalibrationPhase::Learning => self.learn(&mut state, knee_angle),
            CalibrationPhase::Counting => {
                let baseline = match state.baseline_angle {
                    Some(baseline) => baseline,
                    None => {
                        let baseline = self.compute_baseline(&state.observed_minima);
                        state.baseline_angle = Some(baseline);
                        baseline_learned = Some(baseline);
                        baseline
                    }
                };
                self.count(&mut state, knee_angle, baseline);
            }
        }

        ControllerStep {
            reps_added: state.rep_count - reps_before,
            state,
            baseline_learned,
        }
    }

    fn learn(&self, state: &mut CalibrationState, knee_angle: f64) {
        if knee_angle > self.thresholds.recovery_angle {
            if state.stage == Some(Stage::Down) {
                debug_assert!(state.observed_minima.len() < self.thresholds.learn_target as usize);
                state.observed_minima.push(state.tracked_min_angle);
                state.tracked_min_angle = self.thresholds.recovery_angle;
                state.rep_count += 1;
            }
            // Set even on the frame that just closed a rep
            state.stage = Some(Stage::Up);
        }

        if knee_angle < self.thresholds.engage_angle {
            state.stage = Some(Stage::Down);
            state.tracked_min_angle = state.tracked_min_angle.min(knee_angle);
        }
    }

    fn count(&self, state: &mut CalibrationState, knee_angle: f64, baseline: f64) {
        if knee_angle > self.thresholds.recovery_angle {
            state.stage = Some(Stage::Up);
        }

        if knee_angle < baseline && state.stage == Some(Stage::Up) {
            state.stage = Some(Stage::Down);
            state.rep_count += 1;
        }
    }

    fn compute_baseline(&self, minima: &[f64]) -> f64 {
        if minima.is_empty() {
            return self.thresholds.engage_angle;
        }
        minima.iter().sum::<f64>() / minima.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(controller: &CalibrationController, angles: &[f64]) -> Vec<ControllerStep> {
        let mut state = controller.initial_state();
        let mut steps = Vec::with_capacity(angles.len());
        for &angle in angles {
            let step = controller.advance(state, angle);
            state = step.state.clone();
            steps.push(step);
        }
        steps
    }

    #[test]
    fn test_reference_sequence_learns_baseline() {
        let controller = CalibrationController::default();
        let steps = run(&controller, &[170.0, 135.0, 165.0, 128.0, 170.0, 172.0]);

        // Frame 1: recovered from no stage
        assert_eq!(steps[0].state.stage, Some(Stage::Up));
        assert_eq!(steps[0].state.rep_count, 0);

        // Frame 2: engaged
        assert_eq!(steps[1].state.stage, Some(Stage::Down));
        assert_eq!(steps[1].state.tracked_min_angle, 135.0);

        // Frame 3: first rep closes
        assert_eq!(steps[2].state.rep_count, 1);
        assert_eq!(steps[2].state.observed_minima, vec![135.0]);
        assert_eq!(steps[2].state.stage, Some(Stage::Up));
        assert_eq!(steps[2].state.tracked_min_angle, 160.0);
        assert_eq!(steps[2].reps_added, 1);

        // Frame 5: second rep closes, still no baseline
        assert_eq!(steps[4].state.rep_count, 2);
        assert_eq!(steps[4].state.observed_minima, vec![135.0, 128.0]);
        assert_eq!(steps[4].state.baseline_angle, None);

        // Frame 6: enters Counting with the mean of the minima
        assert_eq!(steps[5].baseline_learned, Some(131.5));
        assert_eq!(steps[5].state.baseline_angle, Some(131.5));
        assert_eq!(steps[5].state.rep_count, 2);
        assert_eq!(controller.phase(&steps[5].state), CalibrationPhase::Counting);
    }

    #[test]
    fn test_between_thresholds_keeps_stage() {
        let controller = CalibrationController::default();
        let steps = run(&controller, &[130.0, 150.0, 145.0]);
        assert!(steps
            .iter()
            .all(|step| step.state.stage == Some(Stage::Down)));
        assert_eq!(steps[2].state.tracked_min_angle, 130.0);
    }

    #[test]
    fn test_no_stage_until_threshold_crossed() {
        let controller = CalibrationController::default();
        let steps = run(&controller, &[150.0, 155.0]);
        assert_eq!(steps[1].state.stage, None);
        assert_eq!(steps[1].state.rep_count, 0);
    }

    #[test]
    fn test_minimum_tracks_deepest_frame_of_cycle() {
        let controller = CalibrationController::default();
        let steps = run(&controller, &[170.0, 138.0, 121.0, 133.0, 165.0]);
        assert_eq!(steps[4].state.observed_minima, vec![121.0]);
    }

    #[test]
    fn test_counting_counts_on_descent_below_baseline() {
        let controller = CalibrationController::default();
        let steps = run(
            &controller,
            &[
                170.0, 135.0, 165.0, 128.0, 170.0, // learning, baseline 131.5
                172.0, // enters Counting
                135.0, // above baseline: no rep
                130.0, // below baseline with stage Up: rep 3
                125.0, // already Down: no rep
                170.0, // back Up
                131.0, // rep 4
            ],
        );

        assert_eq!(steps[6].state.rep_count, 2);
        assert_eq!(steps[7].state.rep_count, 3);
        assert_eq!(steps[7].reps_added, 1);
        assert_eq!(steps[8].state.rep_count, 3);
        assert_eq!(steps[9].state.stage, Some(Stage::Up));
        assert_eq!(steps[10].state.rep_count, 4);
    }

    #[test]
    fn test_counting_freezes_learning_buffers() {
        let controller = CalibrationController::default();
        let steps = run(
            &controller,
            &[170.0, 135.0, 165.0, 128.0, 170.0, 172.0, 100.0, 170.0, 90.0],
        );
        let last = &steps.last().unwrap().state;
        assert_eq!(last.observed_minima, vec![135.0, 128.0]);
        assert_eq!(last.baseline_angle, Some(131.5));
        assert_eq!(last.rep_count, 4);
    }

    #[test]
    fn test_empty_minima_falls_back_to_engage_threshold() {
        let controller = CalibrationController::new(RepThresholds {
            learn_target: 0,
            ..RepThresholds::default()
        });
        let step = controller.advance(controller.initial_state(), 170.0);
        assert_eq!(step.baseline_learned, Some(ENGAGE_THRESHOLD_ANGLE));
        assert_eq!(step.state.stage, Some(Stage::Up));

        let step = controller.advance(step.state, 139.0);
        assert_eq!(step.state.rep_count, 1);
    }

    #[test]
    fn test_non_finite_angle_ignored() {
        let controller = CalibrationController::default();
        let state = controller.advance(controller.initial_state(), 130.0).state;
        let step = controller.advance(state.clone(), f64::NAN);
        assert_eq!(step.state, state);
        assert_eq!(step.reps_added, 0);
    }

    #[test]
    fn test_reset_from_counting() {
        let controller = CalibrationController::default();
        let steps = run(&controller, &[170.0, 135.0, 165.0, 128.0, 170.0, 172.0]);
        assert!(steps[5].state.is_calibrated());

        let reset = controller.reset();
        assert_eq!(reset, CalibrationState::new_default());
    }

    #[test]
    fn test_rep_count_never_decreases() {
        let controller = CalibrationController::default();
        // Deterministic pseudo-random walk over [80, 180]
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut angles = Vec::with_capacity(2000);
        for _ in 0..2000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            angles.push(80.0 + (seed % 10_000) as f64 / 100.0);
        }

        let steps = run(&controller, &angles);
        for pair in steps.windows(2) {
            assert!(pair[1].state.rep_count >= pair[0].state.rep_count);
            assert!(pair[1].reps_added <= 1);
        }
        for step in &steps {
            assert!(step.state.observed_minima.len() <= LEARN_TARGET as usize);
        }
    }
}
