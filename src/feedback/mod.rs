// Feedback module - posture classification and announcement debounce
//
// 1. FeedbackClassifier: stage/back angle/rep count -> FeedbackCategory
// 2. AnnouncementGate: cooldown debounce over an injected TimeSource
// 3. Announcer: the side-effect channel the gate guards

pub mod announcer;
pub mod classifier;
pub mod clock;
pub mod debounce;

pub use announcer::{Announcer, LogAnnouncer, NullAnnouncer, RecordingAnnouncer};
pub use classifier::{FeedbackCategory, FeedbackClassifier, PostureLimits};
pub use clock::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use debounce::{AnnouncementGate, FeedbackState, COOLDOWN_SECONDS};
