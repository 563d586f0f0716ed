//! Telemetry event types exposed to the CLI and HTTP surfaces.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationPhase;

/// Session-level metric events published by the session manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    RepCounted {
        session_id: String,
        rep_count: u32,
        phase: CalibrationPhase,
    },
    BaselineLearned {
        session_id: String,
        baseline_angle: f64,
    },
    FeedbackAnnounced {
        session_id: String,
        message: String,
    },
    FrameRejected {
        session_id: String,
        code: i32,
    },
    SessionReset {
        session_id: String,
    },
}

impl MetricEvent {
    pub fn session_id(&self) -> &str {
        match self {
            MetricEvent::RepCounted { session_id, .. }
            | MetricEvent::BaselineLearned { session_id, .. }
            | MetricEvent::FeedbackAnnounced { session_id, .. }
            | MetricEvent::FrameRejected { session_id, .. }
            | MetricEvent::SessionReset { session_id } => session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag_and_payload() {
        let event = MetricEvent::RepCounted {
            session_id: "s1".to_string(),
            rep_count: 3,
            phase: CalibrationPhase::Counting,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "rep_counted");
        assert_eq!(json["payload"]["rep_count"], 3);
        assert_eq!(json["payload"]["phase"], "counting");
        assert_eq!(event.session_id(), "s1");
    }
}
