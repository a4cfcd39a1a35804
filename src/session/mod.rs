//! Client-side session and data synchronization.
//!
//! One `SessionController` owns the "who is logged in / what is their
//! profile" state a front-end renders from, exposed through a narrow
//! interface: `snapshot()`, `subscribe()`, and commands. There is no ambient
//! singleton; embedders construct a controller and hand out the receiver.
//!
//! The record store is the sole source of truth, so freshness comes from
//! periodic re-fetching rather than push: a newer poll result always
//! replaces an older snapshot wholesale, and background failures are logged
//! and swallowed rather than surfaced.

pub mod controller;
pub mod issues;
pub mod storage;

pub use controller::{Identity, SessionApi, SessionController, SessionSnapshot};
pub use issues::{IssueFeed, IssueFeedSnapshot, IssuesApi};
pub use storage::{MemoryStorage, SessionStore};

use std::time::Duration;

use crate::config::SessionConfig;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// How long a session stays valid past the last recorded activity; a
    /// transient signed-out event inside this window keeps the profile.
    pub timeout: Duration,
    /// Background profile refresh cadence.
    pub poll_interval: Duration,
    /// Background issue-list refresh cadence.
    pub issue_poll_interval: Duration,
    /// Minimum gap between persisted activity-timestamp writes.
    pub activity_throttle: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(8),
            issue_poll_interval: Duration::from_secs(5),
            activity_throttle: Duration::from_secs(30),
        }
    }
}

impl From<&SessionConfig> for SessionOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            poll_interval: Duration::from_secs(config.profile_poll_secs),
            issue_poll_interval: Duration::from_secs(config.issue_poll_secs),
            activity_throttle: Duration::from_secs(config.activity_throttle_secs),
        }
    }
}
