// Managers Module
//
// Focused manager classes that own a single concern each.
//
// - SessionManager: per-frame processing and reset for exercise sessions

pub mod session_manager;

pub use session_manager::SessionManager;
