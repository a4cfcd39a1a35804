//! Session/profile sync controller.
//!
//! Keeps the client's view of the authenticated identity and its profile
//! consistent with the identity provider and the record store across page
//! loads, background time, and concurrent tabs, without blocking the UI.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::storage::{keys, SessionStore};
use super::SessionOptions;
use crate::client::ClientError;
use crate::types::{ProfileUpdate, UserProfile};

/// The authenticated identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// What a front-end renders from. Replaced wholesale on every change;
/// subscribe via [`SessionController::subscribe`].
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub profile: Option<UserProfile>,
    /// Initial session resolution in progress. Transitions true -> false
    /// once and is never toggled by background refreshes.
    pub loading: bool,
    /// A background refresh is in flight.
    pub syncing: bool,
    pub error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            identity: None,
            profile: None,
            loading: true,
            syncing: false,
            error: None,
        }
    }
}

/// Portal operations the controller depends on. Implemented by
/// [`crate::client::PortalClient`]; tests substitute fakes.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Fetch-or-create the caller's profile (the bootstrap contract).
    async fn bootstrap(&self) -> Result<UserProfile, ClientError>;

    async fn fetch_profile(&self) -> Result<UserProfile, ClientError>;

    async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, ClientError>;

    /// Revoke the identity-provider session.
    async fn sign_out(&self) -> Result<(), ClientError>;
}

pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn SessionApi>,
    storage: Arc<dyn SessionStore>,
    options: SessionOptions,
    state: watch::Sender<SessionSnapshot>,
    /// Cleared on shutdown; an in-flight refresh checks it before applying
    /// its result.
    alive: AtomicBool,
    last_persisted: Mutex<Option<Instant>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn SessionApi>,
        storage: Arc<dyn SessionStore>,
        options: SessionOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                api,
                storage,
                options,
                state,
                alive: AtomicBool::new(true),
                last_persisted: Mutex::new(None),
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Identity change notification. Fires once at startup with the restored
    /// session (or `None`) and again on every sign-in and sign-out.
    pub async fn identity_changed(&self, identity: Option<Identity>) {
        match identity {
            Some(identity) => Inner::signed_in(&self.inner, identity).await,
            None => self.inner.signed_out(),
        }
    }

    /// Stash signup-form fields before the profile record can exist (record
    /// creation needs an authenticated identity, which only exists once
    /// signup completes). Applied and cleared by the first successful
    /// resolution.
    pub fn stash_pending_signup(&self, display_name: Option<&str>, phone: Option<&str>) {
        if let Some(name) = display_name {
            self.inner.storage.set(keys::PENDING_DISPLAY_NAME, name);
        }
        if let Some(phone) = phone {
            self.inner.storage.set(keys::PENDING_PHONE, phone);
        }
    }

    /// User-interaction hook (pointer press, key press, scroll, touch).
    /// Extends the session validity window; the persisted timestamp is
    /// written at most once per throttle period.
    pub fn record_activity(&self) {
        let mut last = self.inner.last_persisted.lock().unwrap();
        let due = match *last {
            Some(at) => at.elapsed() >= self.inner.options.activity_throttle,
            None => true,
        };
        if due {
            self.inner.persist_activity();
            *last = Some(Instant::now());
        }
    }

    /// Manual, non-silent profile refresh. Failures land in the snapshot's
    /// error field; the current profile is kept.
    pub async fn refresh(&self) -> Result<UserProfile, ClientError> {
        match self.inner.api.fetch_profile().await {
            Ok(profile) => {
                self.inner.update(|s| {
                    s.profile = Some(profile.clone());
                    s.error = None;
                });
                Ok(profile)
            }
            Err(e) => {
                self.inner.update(|s| s.error = Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Self-service profile update through the controller, so the snapshot
    /// reflects the result immediately instead of on the next poll.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, ClientError> {
        let profile = self.inner.api.update_profile(update).await?;
        self.inner.update(|s| s.profile = Some(profile.clone()));
        Ok(profile)
    }

    /// Revoke the identity-provider session and clear every trace of the
    /// local one.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.inner.api.sign_out().await?;

        self.inner.stop_poller();
        self.inner.clear_bookkeeping();
        self.inner.storage.remove(keys::PENDING_DISPLAY_NAME);
        self.inner.storage.remove(keys::PENDING_PHONE);
        self.inner.update(|s| {
            s.identity = None;
            s.profile = None;
            s.error = None;
            s.loading = false;
        });
        Ok(())
    }

    /// Tear the controller down: stops the poll task and prevents any
    /// in-flight refresh from applying its result.
    pub fn shutdown(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        self.inner.stop_poller();
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn update(&self, mutate: impl FnOnce(&mut SessionSnapshot)) {
        self.state.send_modify(mutate);
    }

    async fn signed_in(inner: &Arc<Self>, identity: Identity) {
        inner.update(|s| {
            s.identity = Some(identity.clone());
            s.error = None;
        });

        let resolved = inner.resolve_profile().await;
        if !inner.alive.load(Ordering::SeqCst) {
            return;
        }

        match resolved {
            Ok(profile) => {
                inner.update(|s| {
                    s.profile = Some(profile);
                    s.loading = false;
                });
                // Signing in counts as activity; it opens the validity window.
                inner.persist_activity();
            }
            Err(e) => {
                // Fatal to this attempt. No retry loop: the user retries
                // manually, typically by reloading.
                tracing::error!("initial profile resolution failed: {}", e);
                inner.update(|s| {
                    s.error = Some(e.to_string());
                    s.loading = false;
                });
            }
        }

        Inner::ensure_poller(inner);
    }

    /// The provider can emit a transient signed-out event (token rotation,
    /// flaky network) that must not be treated as a real logout. Keep the
    /// profile when the persisted activity timestamp is still inside the
    /// validity window.
    fn signed_out(&self) {
        let within_window = self
            .storage
            .get(keys::LAST_ACTIVE)
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(|ts| {
                let age = chrono::Utc::now().timestamp() - ts;
                age >= 0 && age <= self.options.timeout.as_secs() as i64
            })
            .unwrap_or(false);

        if within_window {
            tracing::debug!("transient signed-out event inside validity window, keeping profile");
            self.update(|s| {
                s.identity = None;
                s.loading = false;
            });
        } else {
            self.clear_bookkeeping();
            self.update(|s| {
                s.identity = None;
                s.profile = None;
                s.loading = false;
            });
        }
    }

    /// Bootstrap, then fold in any pending signup fields. Pending values are
    /// cleared only after they were applied successfully, so a failed apply
    /// leaves them for the next attempt and a cleared value is never
    /// reapplied.
    async fn resolve_profile(&self) -> Result<UserProfile, ClientError> {
        let profile = self.api.bootstrap().await?;

        let pending = ProfileUpdate {
            display_name: self.storage.get(keys::PENDING_DISPLAY_NAME),
            phone: self.storage.get(keys::PENDING_PHONE),
        };
        if pending.is_empty() {
            return Ok(profile);
        }

        let updated = self.api.update_profile(pending).await?;
        self.storage.remove(keys::PENDING_DISPLAY_NAME);
        self.storage.remove(keys::PENDING_PHONE);
        Ok(updated)
    }

    fn ensure_poller(inner: &Arc<Self>) {
        let mut guard = inner.poller.lock().unwrap();
        if guard.is_some() {
            return;
        }

        let inner = Arc::clone(inner);
        *guard = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.options.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial resolution
            // already ran.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !inner.alive.load(Ordering::SeqCst) {
                    break;
                }
                let ready = {
                    let snapshot = inner.state.borrow();
                    snapshot.identity.is_some() && !snapshot.loading
                };
                if ready {
                    inner.silent_refresh().await;
                }
            }
        }));
    }

    /// Background refresh: toggles only the syncing flag and swallows
    /// failures. Must never interrupt the session or clear the profile.
    async fn silent_refresh(&self) {
        self.update(|s| s.syncing = true);

        let result = self.api.fetch_profile().await;
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }

        match result {
            Ok(profile) => self.update(|s| {
                s.profile = Some(profile);
                s.syncing = false;
            }),
            Err(e) => {
                tracing::warn!("background profile refresh failed: {}", e);
                self.update(|s| s.syncing = false);
            }
        }
    }

    fn persist_activity(&self) {
        self.storage
            .set(keys::LAST_ACTIVE, &chrono::Utc::now().timestamp().to_string());
    }

    fn clear_bookkeeping(&self) {
        self.storage.remove(keys::LAST_ACTIVE);
    }

    fn stop_poller(&self) {
        if let Some(task) = self.poller.lock().unwrap().take() {
            task.abort();
        }
    }
}
