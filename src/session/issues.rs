//! Issue-list feed with background polling.
//!
//! Same lifecycle rules as the profile sync: an initial non-silent load,
//! then a fixed-interval silent poll that replaces the list wholesale.
//! Toggling `show_resolved` tears the running poll down and starts a fresh
//! one; a generation counter keeps an in-flight request from a torn-down
//! scope from applying its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::SessionOptions;
use crate::client::ClientError;
use crate::types::Issue;

#[async_trait]
pub trait IssuesApi: Send + Sync {
    async fn list_issues(&self, include_resolved: bool) -> Result<Vec<Issue>, ClientError>;

    async fn resolve_issue(&self, id: &str) -> Result<Issue, ClientError>;
}

#[derive(Debug, Clone)]
pub struct IssueFeedSnapshot {
    pub issues: Vec<Issue>,
    pub show_resolved: bool,
    pub loading: bool,
    pub syncing: bool,
    pub error: Option<String>,
}

impl Default for IssueFeedSnapshot {
    fn default() -> Self {
        Self {
            issues: Vec::new(),
            show_resolved: false,
            loading: true,
            syncing: false,
            error: None,
        }
    }
}

pub struct IssueFeed {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    api: Arc<dyn IssuesApi>,
    options: SessionOptions,
    state: watch::Sender<IssueFeedSnapshot>,
    generation: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl IssueFeed {
    pub fn new(api: Arc<dyn IssuesApi>, options: SessionOptions) -> Self {
        let (state, _) = watch::channel(IssueFeedSnapshot::default());
        Self {
            inner: Arc::new(FeedInner {
                api,
                options,
                state,
                generation: AtomicU64::new(0),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> IssueFeedSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<IssueFeedSnapshot> {
        self.inner.state.subscribe()
    }

    /// Begin loading and polling with the current `show_resolved` setting.
    pub fn start(&self) {
        FeedInner::restart(&self.inner);
    }

    /// Switch between open-only and full history. Tears down the running
    /// poll and reloads from scratch.
    pub fn set_show_resolved(&self, show_resolved: bool) {
        self.inner.update(|s| s.show_resolved = show_resolved);
        FeedInner::restart(&self.inner);
    }

    /// Mark an issue resolved and drop it from the open list immediately;
    /// the next poll re-syncs against the store either way.
    pub async fn resolve(&self, id: &str) -> Result<Issue, ClientError> {
        let resolved = self.inner.api.resolve_issue(id).await?;
        self.inner.update(|s| {
            if s.show_resolved {
                if let Some(row) = s.issues.iter_mut().find(|i| i.id == resolved.id) {
                    *row = resolved.clone();
                }
            } else {
                s.issues.retain(|i| i.id != resolved.id);
            }
        });
        Ok(resolved)
    }

    pub fn shutdown(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.inner.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

impl Drop for IssueFeed {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl FeedInner {
    fn update(&self, mutate: impl FnOnce(&mut IssueFeedSnapshot)) {
        self.state.send_modify(mutate);
    }

    fn current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn restart(inner: &Arc<Self>) {
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(task) = inner.task.lock().unwrap().take() {
            task.abort();
        }

        let worker = Arc::clone(inner);
        let task = tokio::spawn(async move { worker.run(generation).await });
        *inner.task.lock().unwrap() = Some(task);
    }

    async fn run(&self, generation: u64) {
        let show_resolved = {
            let snapshot = self.state.borrow();
            snapshot.show_resolved
        };

        // Initial load is non-silent: it owns the loading flag and surfaces
        // its error to the caller.
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });
        let initial = self.api.list_issues(show_resolved).await;
        if !self.current(generation) {
            return;
        }
        match initial {
            Ok(issues) => self.update(|s| {
                s.issues = issues;
                s.loading = false;
            }),
            Err(e) => {
                self.update(|s| {
                    s.error = Some(format!("Failed to load issues: {}", e));
                    s.loading = false;
                });
                return;
            }
        }

        let mut interval = tokio::time::interval(self.options.issue_poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            interval.tick().await;
            if !self.current(generation) {
                return;
            }

            self.update(|s| s.syncing = true);
            let result = self.api.list_issues(show_resolved).await;
            if !self.current(generation) {
                return;
            }
            match result {
                Ok(issues) => self.update(|s| {
                    s.issues = issues;
                    s.syncing = false;
                }),
                Err(e) => {
                    // Silent fail
                    tracing::warn!("background issue sync failed: {}", e);
                    self.update(|s| s.syncing = false);
                }
            }
        }
    }
}
