// AnnouncementGate - cooldown debounce for spoken feedback
//
// The feedback string is returned to the caller on every frame. Only the
// side-effecting announcement channel is gated: it fires when the message
// differs from the last announced one AND the cooldown has elapsed since the
// last announcement.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::feedback::clock::{SystemTimeSource, TimeSource};

/// Minimum interval between announcements
pub const COOLDOWN_SECONDS: u64 = 10;

/// Announcement bookkeeping for one session
///
/// Mutated only when the announcement actually fires.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedbackState {
    /// Last announced message (empty before the first announcement)
    pub last_feedback: String,
    /// Clock reading of the last announcement, in milliseconds
    pub last_spoken_at_ms: Option<u64>,
}

/// Debounce gate for the announcement channel
#[derive(Clone)]
pub struct AnnouncementGate {
    cooldown: Duration,
    clock: Arc<dyn TimeSource>,
}

impl AnnouncementGate {
    pub fn new(cooldown: Duration, clock: Arc<dyn TimeSource>) -> Self {
        Self { cooldown, clock }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decide whether `message` should be announced now
    ///
    /// Returns `true` and records the announcement in `state` when the gate
    /// opens; leaves `state` untouched otherwise.
    pub fn should_announce(&self, state: &mut FeedbackState, message: &str) -> bool {
        if message.is_empty() || state.last_feedback == message {
            return false;
        }

        let now_ms = self.clock.now_ms();
        let cooled_down = match state.last_spoken_at_ms {
            None => true,
            Some(last_ms) => {
                now_ms.saturating_sub(last_ms) >= self.cooldown.as_millis() as u64
            }
        };
        if !cooled_down {
            return false;
        }

        state.last_feedback = message.to_string();
        state.last_spoken_at_ms = Some(now_ms);
        true
    }
}

impl Default for AnnouncementGate {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(COOLDOWN_SECONDS),
            Arc::new(SystemTimeSource::default()),
        )
    }
}
