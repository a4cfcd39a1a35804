//! Append-only change log of profile updates.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::RecordStore;
use crate::types::UserProfile;

#[derive(Clone)]
pub struct ChangeLog {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl ChangeLog {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self { store, table: table.into() }
    }

    /// Append a snapshot of the profile as of this update. Best-effort: a
    /// failed append never fails the parent update, it is logged and dropped.
    pub async fn append(&self, profile: &UserProfile) {
        let mut fields = Map::new();
        fields.insert("uid".into(), Value::String(profile.uid.clone()));
        fields.insert("email".into(), Value::String(profile.email.clone()));
        fields.insert(
            "displayName".into(),
            Value::String(profile.display_name.clone()),
        );
        fields.insert("phone".into(), Value::String(profile.phone.clone()));
        fields.insert("role".into(), Value::String(profile.role.to_string()));
        fields.insert(
            "loggedAt".into(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );

        if let Err(e) = self.store.create(&self.table, fields).await {
            tracing::warn!(uid = %profile.uid, "change log append failed: {}", e);
        }
    }
}
