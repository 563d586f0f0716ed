// Session module - state storage contract and per-key serialization

pub mod locks;
pub mod store;

pub use locks::SessionLocks;
pub use store::{InMemorySessionStore, SessionState, SessionStore};
