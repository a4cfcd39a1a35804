//! Persistence seam for session bookkeeping.
//!
//! The controller keeps its last-activity timestamp and pending-signup
//! fields outside in-memory state so they survive page loads and are shared
//! across concurrent tabs. A front-end binds this to its local storage; the
//! in-memory implementation serves tests and headless embedding.

use std::collections::HashMap;
use std::sync::Mutex;

/// Well-known bookkeeping keys.
pub mod keys {
    pub const LAST_ACTIVE: &str = "session.lastActiveAt";
    pub const PENDING_DISPLAY_NAME: &str = "signup.pendingDisplayName";
    pub const PENDING_PHONE: &str = "signup.pendingPhone";
}

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.inner.lock().unwrap().remove(key);
    }
}
