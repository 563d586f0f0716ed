// Public report types for callers of the session manager
//
// These are the JSON shapes returned by the HTTP routes and printed by the
// CLI replay command.

pub mod types;

pub use types::{round2, ErrorReport, FrameReport, ResetReport};
