// Calibration module - rep counting with a learned engage threshold
//
// This module provides two main components:
// 1. CalibrationState: Per-session rep count, stage, minima and baseline
// 2. CalibrationController: Learning/Counting state machine over knee angles
//
// The calibration workflow:
// 1. Create CalibrationState for a session
// 2. Feed one knee angle per frame through CalibrationController::advance
// 3. After LEARN_TARGET reps the baseline is fixed and reps are counted
//    against it until an explicit reset

pub mod controller;
pub mod state;

pub use controller::{
    CalibrationController, ControllerStep, RepThresholds, ENGAGE_THRESHOLD_ANGLE, LEARN_TARGET,
    RECOVERY_THRESHOLD_ANGLE,
};
pub use state::{CalibrationPhase, CalibrationState, Stage};
