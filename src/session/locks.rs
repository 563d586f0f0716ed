//! Per-session write serialization.
//!
//! One `Mutex<()>` per session id. Holding the guard across
//! read-modify-persist makes frames for the same id single-writer, while
//! different ids never contend past the brief map lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::SessionError;

/// Per-id mutex registry.
///
/// Entries are never removed: every distinct session id seen keeps its
/// mutex for the life of the process.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for `session_id`, created on first use
    pub fn handle(&self, session_id: &str) -> Result<Arc<Mutex<()>>, SessionError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| SessionError::LockPoisoned {
                session_id: session_id.to_string(),
            })?;
        Ok(Arc::clone(
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }

    /// Number of ids that have been locked at least once
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_shares_one_mutex() {
        let locks = SessionLocks::new();
        let a = locks.handle("s").unwrap();
        let b = locks.handle("s").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(locks.tracked(), 1);
    }

    #[test]
    fn different_ids_do_not_block_each_other() {
        let locks = SessionLocks::new();
        let a = locks.handle("a").unwrap();
        let b = locks.handle("b").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        let _guard_a = a.lock().unwrap();
        assert!(b.try_lock().is_ok());
    }

    #[test]
    fn released_handles_stay_tracked() {
        let locks = SessionLocks::new();
        for id in ["a", "b", "c"] {
            let handle = locks.handle(id).unwrap();
            drop(handle.lock().unwrap());
        }
        assert_eq!(locks.tracked(), 3);
    }
}
