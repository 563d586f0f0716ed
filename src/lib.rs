// Physio Trainer Core - per-frame exercise rep counting engine
// Pose landmarks in, rep count, stage, learned baseline and posture feedback out

// Module declarations
pub mod api;
pub mod calibration;
pub mod config;
pub mod error;
pub mod feedback;
pub mod fixtures;
#[cfg(feature = "http")]
pub mod http;
pub mod managers;
pub mod pose;
pub mod session;
pub mod telemetry;

// Re-exports for convenience
pub use api::{FrameReport, ResetReport};
pub use config::AppConfig;
pub use error::{ErrorCode, FrameError};
pub use managers::SessionManager;
pub use pose::PoseFrame;

/// Install the process-wide tracing subscriber
///
/// Library code logs through the `log` facade; the subscriber bridges those
/// records. Output goes to stderr so stdout stays machine-readable. Honors
/// `RUST_LOG` and defaults to `info`. Safe to call more than once.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        log::info!("logging initialized twice without panicking");
    }
}
