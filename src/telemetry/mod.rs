//! Session telemetry collector and helpers.
//!
//! The collector multiplexes rep, baseline, announcement, rejection and reset
//! events into a bounded history plus an async broadcast stream. The hub also
//! keeps a rolling window of accepted knee angles for the snapshot.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use crate::calibration::CalibrationPhase;

pub mod events;

pub use events::MetricEvent;

/// Global telemetry hub shared across the crate.
static HUB: Lazy<TelemetryHub> = Lazy::new(TelemetryHub::default);

/// Access the global telemetry hub.
pub fn hub() -> &'static TelemetryHub {
    &HUB
}

/// Min/max of the knee angles currently in the rolling window.
///
/// The window is shared by every session on the hub, so one range can mix
/// samples from different patients.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KneeAngleRange {
    pub min: f64,
    pub max: f64,
    pub sample_count: usize,
}

/// Snapshot of collector state for HTTP/CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
    pub knee_angle_range: Option<KneeAngleRange>,
}

/// Broadcast-based collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut history) = self.history.lock() {
            if self.history_capacity > 0 && history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            if self.history_capacity > 0 {
                history.push_back(event.clone());
            }
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    fn recent(&self) -> Vec<MetricEvent> {
        self.history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            recent: self.recent(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
            knee_angle_range: None,
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Rolling window over accepted knee angles.
struct AngleRangeTracker {
    samples: VecDeque<f64>,
    max_samples: usize,
}

impl AngleRangeTracker {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    fn observe(&mut self, value: f64) {
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    fn range(&self) -> Option<KneeAngleRange> {
        if self.samples.is_empty() {
            return None;
        }
        let (min, max) = self
            .samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &next| {
                (lo.min(next), hi.max(next))
            });
        Some(KneeAngleRange {
            min,
            max,
            sample_count: self.samples.len(),
        })
    }
}

/// Top-level hub wrapping collector state plus the knee-angle gauge.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    knee_angles: Mutex<AngleRangeTracker>,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize, angle_window: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            knee_angles: Mutex::new(AngleRangeTracker::new(angle_window)),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut snapshot = self.collector.snapshot();
        snapshot.knee_angle_range = self
            .knee_angles
            .lock()
            .ok()
            .and_then(|tracker| tracker.range());
        snapshot
    }

    /// Add a sample to the hub-wide window; non-finite angles are skipped
    pub fn record_knee_angle(&self, knee_angle: f64) {
        if !knee_angle.is_finite() {
            return;
        }
        if let Ok(mut tracker) = self.knee_angles.lock() {
            tracker.observe(knee_angle);
        }
    }

    pub fn record_rep(&self, session_id: &str, rep_count: u32, phase: CalibrationPhase) {
        self.collector.publish(MetricEvent::RepCounted {
            session_id: session_id.to_string(),
            rep_count,
            phase,
        });
    }

    pub fn record_baseline(&self, session_id: &str, baseline_angle: f64) {
        self.collector.publish(MetricEvent::BaselineLearned {
            session_id: session_id.to_string(),
            baseline_angle,
        });
    }

    pub fn record_announcement(&self, session_id: &str, message: &str) {
        self.collector.publish(MetricEvent::FeedbackAnnounced {
            session_id: session_id.to_string(),
            message: message.to_string(),
        });
    }

    pub fn record_rejection(&self, session_id: &str, code: i32) {
        self.collector.publish(MetricEvent::FrameRejected {
            session_id: session_id.to_string(),
            code,
        });
    }

    pub fn record_reset(&self, session_id: &str) {
        self.collector.publish(MetricEvent::SessionReset {
            session_id: session_id.to_string(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64, 120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_keeps_bounded_history() {
        let collector = TelemetryCollector::new(4, 2);
        for idx in 0..3 {
            collector.publish(MetricEvent::SessionReset {
                session_id: format!("s{idx}"),
            });
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.recent[0].session_id(), "s1");
    }

    #[test]
    fn subscribers_receive_published_events() {
        let hub = TelemetryHub::new(8, 8, 4);
        let mut rx = hub.collector().subscribe();

        hub.record_baseline("s1", 131.5);

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            MetricEvent::BaselineLearned {
                session_id: "s1".to_string(),
                baseline_angle: 131.5,
            }
        );
    }

    #[test]
    fn knee_angle_range_rolls_over() {
        let hub = TelemetryHub::new(8, 8, 3);
        assert!(hub.snapshot().knee_angle_range.is_none());

        for angle in [170.0, 120.0, 150.0, 160.0] {
            hub.record_knee_angle(angle);
        }
        hub.record_knee_angle(f64::NAN);

        let range = hub.snapshot().knee_angle_range.unwrap();
        assert_eq!(range.sample_count, 3);
        assert_eq!(range.min, 120.0);
        assert_eq!(range.max, 160.0);
    }

    #[test]
    fn hub_records_each_event_kind() {
        let hub = TelemetryHub::new(8, 8, 4);
        hub.record_rep("s", 1, CalibrationPhase::Learning);
        hub.record_announcement("s", "Good posture");
        hub.record_rejection("s", 3001);
        hub.record_reset("s");

        let recent = hub.snapshot().recent;
        assert_eq!(recent.len(), 4);
        assert!(matches!(recent[2], MetricEvent::FrameRejected { code: 3001, .. }));
    }
}
