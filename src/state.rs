//! Shared application state injected into the router.

use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::identity::{HttpIdentityProvider, IdentityProvider};
use crate::store::{ChangeLog, HttpRecordStore, IssueRecords, MemoryStore, RecordStore, UserRecords};

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub users: UserRecords,
    pub issues: IssueRecords,
    pub changelog: ChangeLog,
}

impl AppState {
    /// Wire collaborators from configuration.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn RecordStore> = match config.store.backend {
            StoreBackend::Http => Arc::new(HttpRecordStore::new(&config.store)?),
            StoreBackend::Memory => {
                tracing::warn!("running against the in-memory record store; data will not persist");
                Arc::new(MemoryStore::new())
            }
        };
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(HttpIdentityProvider::new(config.identity.clone())?);

        Ok(Self::assemble(identity, store, config))
    }

    /// Build state over explicit collaborators; tests use this with the
    /// memory backend.
    pub fn assemble(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn RecordStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            identity,
            users: UserRecords::new(store.clone(), &config.store.users_table),
            issues: IssueRecords::new(store.clone(), &config.store.issues_table),
            changelog: ChangeLog::new(store, &config.store.changelog_table),
        }
    }
}
