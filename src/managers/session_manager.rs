// SessionManager: per-frame orchestration for exercise sessions
//
// Single Responsibility: turn one detector frame into one FrameReport
// Extracts angles, advances the session's calibration state, classifies
// posture, gates announcements, and persists the result under a
// per-session lock.

use std::sync::Arc;

use log::{debug, info};

use crate::api::{FrameReport, ResetReport};
use crate::calibration::CalibrationController;
use crate::config::AppConfig;
use crate::error::{
    log_pose_error, log_session_error, ErrorCode, FrameError, PoseError, SessionError,
};
use crate::feedback::{
    AnnouncementGate, Announcer, FeedbackClassifier, LogAnnouncer, SystemTimeSource, TimeSource,
};
use crate::pose::{AngleExtractor, JointAngleSample, LeftSideLandmarks, PoseFrame};
use crate::session::{InMemorySessionStore, SessionLocks, SessionState, SessionStore};
use crate::telemetry::{self, TelemetryHub};

/// Processes frames and resets for any number of concurrent sessions
///
/// Frames for the same session id are serialized; frames for different
/// ids run in parallel. A frame that fails angle extraction never touches
/// session state.
///
/// # Example
/// ```ignore
/// let manager = SessionManager::new(&AppConfig::default());
/// let report = manager.process_frame("patient-7", &frame)?;
/// println!("{} reps", report.reps);
/// ```
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    extractor: AngleExtractor,
    controller: CalibrationController,
    classifier: FeedbackClassifier,
    gate: AnnouncementGate,
    announcer: Arc<dyn Announcer>,
    telemetry: &'static TelemetryHub,
}

impl SessionManager {
    /// Create a manager from configuration
    ///
    /// Uses an in-memory store, the system clock, a logging announcer and
    /// the global telemetry hub. Swap any of them with the `with_*` methods.
    pub fn new(config: &AppConfig) -> Self {
        let thresholds = config.rep_counting.thresholds();
        let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource::default());

        Self {
            store: Arc::new(InMemorySessionStore::new(thresholds)),
            locks: SessionLocks::new(),
            extractor: AngleExtractor::new(),
            controller: CalibrationController::new(thresholds),
            classifier: FeedbackClassifier::new(
                config.feedback.posture_limits(),
                thresholds.learn_target,
            ),
            gate: AnnouncementGate::new(config.feedback.cooldown(), clock),
            announcer: Arc::new(LogAnnouncer),
            telemetry: telemetry::hub(),
        }
    }

    /// Replace the announcement clock, keeping the configured cooldown
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.gate = AnnouncementGate::new(self.gate.cooldown(), clock);
        self
    }

    pub fn with_announcer(mut self, announcer: Arc<dyn Announcer>) -> Self {
        self.announcer = announcer;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_telemetry(mut self, telemetry: &'static TelemetryHub) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn telemetry(&self) -> &'static TelemetryHub {
        self.telemetry
    }

    pub fn controller(&self) -> &CalibrationController {
        &self.controller
    }

    /// Process one detector frame for `session_id`
    ///
    /// # Returns
    /// * `Ok(FrameReport)` - Rep count, stage, baseline, angles and feedback
    /// * `Err(FrameError)` - Input/computation failure (state untouched) or
    ///   session bookkeeping failure
    ///
    /// # Errors
    /// - Empty session id
    /// - No pose, missing or non-finite landmark
    /// - Degenerate torso geometry
    /// - Lock poisoning or store failure
    pub fn process_frame(
        &self,
        session_id: &str,
        frame: &PoseFrame,
    ) -> Result<FrameReport, FrameError> {
        check_session_id(session_id)?;

        let angles = self.extract_angles(frame).inspect_err(|err| {
            log_pose_error(err, "process_frame");
            self.telemetry.record_rejection(session_id, err.code());
        })?;

        let handle = self.locks.handle(session_id)?;
        let _guard = handle
            .lock()
            .map_err(|_| poisoned(session_id, "process_frame"))?;

        let mut session = self.store.get_or_create(session_id)?;
        let step = self.controller.advance(session.calibration, angles.knee_angle);
        session.calibration = step.state;
        let phase = self.controller.phase(&session.calibration);

        let category = self.classifier.classify(
            session.calibration.stage,
            angles.back_angle,
            session.calibration.rep_count,
        );
        let message = category.message();
        let announce = self.gate.should_announce(&mut session.feedback, message);

        let report = FrameReport::new(&session.calibration, &angles, message);
        self.store.persist(session_id, session).inspect_err(|err| {
            log_session_error(err, "persist_session");
        })?;

        if announce {
            self.announcer.announce(session_id, message);
            self.telemetry.record_announcement(session_id, message);
        }
        if let Some(baseline) = step.baseline_learned {
            info!(
                "[SessionManager] Session {} baseline learned: {:.2} degrees",
                session_id, baseline
            );
            self.telemetry.record_baseline(session_id, baseline);
        }
        if step.reps_added > 0 {
            debug!(
                "[SessionManager] Session {} rep {} ({})",
                session_id,
                report.reps,
                phase.display_name()
            );
            self.telemetry.record_rep(session_id, report.reps, phase);
        }
        self.telemetry.record_knee_angle(angles.knee_angle);

        Ok(report)
    }

    /// Reset `session_id` to default state
    ///
    /// Unknown ids are created in their default state.
    pub fn reset(&self, session_id: &str) -> Result<ResetReport, FrameError> {
        check_session_id(session_id)?;

        let handle = self.locks.handle(session_id)?;
        let _guard = handle.lock().map_err(|_| poisoned(session_id, "reset"))?;

        let state = self.store.reset(session_id).inspect_err(|err| {
            log_session_error(err, "reset_session");
        })?;

        info!("[SessionManager] Session {} reset", session_id);
        self.telemetry.record_reset(session_id);
        Ok(ResetReport::new(&state.calibration))
    }

    /// Current stored state for `session_id` (created if unknown)
    pub fn session_state(&self, session_id: &str) -> Result<SessionState, FrameError> {
        check_session_id(session_id)?;

        let handle = self.locks.handle(session_id)?;
        let _guard = handle
            .lock()
            .map_err(|_| poisoned(session_id, "session_state"))?;
        Ok(self.store.get_or_create(session_id)?)
    }

    /// Number of sessions held by the store
    pub fn sessions_tracked(&self) -> Result<usize, SessionError> {
        self.store.len()
    }

    // ========================================================================
    // HELPER METHODS
    // ========================================================================

    fn extract_angles(&self, frame: &PoseFrame) -> Result<JointAngleSample, PoseError> {
        let joints = LeftSideLandmarks::from_frame(frame)?;
        self.extractor.extract(&joints)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

fn check_session_id(session_id: &str) -> Result<(), SessionError> {
    if session_id.trim().is_empty() {
        let err = SessionError::InvalidSessionId;
        log_session_error(&err, "check_session_id");
        return Err(err);
    }
    Ok(())
}

fn poisoned(session_id: &str, context: &str) -> SessionError {
    let err = SessionError::LockPoisoned {
        session_id: session_id.to_string(),
    };
    log_session_error(&err, context);
    err
}
