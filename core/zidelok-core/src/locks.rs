//! Per-site serialization of lifecycle operations.
//!
//! Two operations on the same site name never overlap (e.g. a delete racing a
//! launch-triggered extraction). Operations on different names run freely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct SiteLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SiteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `name`.
    ///
    /// A panic in an earlier holder does not poison the site; the store has no
    /// in-memory invariants for the lock to protect.
    pub fn with_site<R>(&self, name: &str, f: impl FnOnce() -> R) -> R {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop idle entries so the map does not grow with every name ever used.
            locks.retain(|key, l| key == name || Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(name.to_string()).or_default())
        };

        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of names currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
