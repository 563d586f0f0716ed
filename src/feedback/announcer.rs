//! Side-effecting announcement channel.
//!
//! A text-to-speech client is an external collaborator; it plugs in by
//! implementing [`Announcer`]. The engine only decides *when* to announce.

use std::sync::Mutex;

use log::info;

/// Receiver of debounced feedback announcements.
pub trait Announcer: Send + Sync {
    fn announce(&self, session_id: &str, message: &str);
}

/// Writes announcements to the log.
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, session_id: &str, message: &str) {
        info!("[Announce] session={} message={}", session_id, message);
    }
}

/// Discards announcements.
#[derive(Debug, Default)]
pub struct NullAnnouncer;

impl Announcer for NullAnnouncer {
    fn announce(&self, _session_id: &str, _message: &str) {}
}

/// Keeps every announcement in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    spoken: Mutex<Vec<(String, String)>>,
}

impl RecordingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(session_id, message)` pairs announced so far
    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken
            .lock()
            .map(|spoken| spoken.clone())
            .unwrap_or_default()
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, session_id: &str, message: &str) {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push((session_id.to_string(), message.to_string()));
        }
    }
}
