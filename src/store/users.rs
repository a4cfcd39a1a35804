//! Typed access to the Users table.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Formula, ListQuery, Record, RecordStore, StoreError};
use crate::types::{default_display_name, Role, UserProfile};

#[derive(Clone)]
pub struct UserRecords {
    store: Arc<dyn RecordStore>,
    table: String,
}

/// Partial update of a profile row. Role is only ever set through the admin
/// path; the self-service route constructs this with `role: None`.
#[derive(Debug, Clone, Default)]
pub struct UserFieldPatch {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

impl UserFieldPatch {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.phone.is_none() && self.role.is_none()
    }

    fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = self.display_name {
            fields.insert("displayName".into(), Value::String(name));
        }
        if let Some(phone) = self.phone {
            fields.insert("phone".into(), Value::String(phone));
        }
        if let Some(role) = self.role {
            fields.insert("role".into(), Value::String(role.to_string()));
        }
        fields
    }
}

impl UserRecords {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self { store, table: table.into() }
    }

    pub async fn find_by_uid(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        let rows = self
            .store
            .list(&self.table, ListQuery::first_match(Formula::eq("uid", uid)))
            .await?;
        Ok(rows.into_iter().next().map(profile_from_record))
    }

    /// Create the bootstrap profile for a first login: display name derived
    /// from the email local part, empty phone, lowest-privilege role.
    pub async fn create_profile(&self, uid: &str, email: &str) -> Result<UserProfile, StoreError> {
        let mut fields = Map::new();
        fields.insert("uid".into(), Value::String(uid.to_string()));
        fields.insert("email".into(), Value::String(email.to_string()));
        fields.insert(
            "displayName".into(),
            Value::String(default_display_name(email)),
        );
        fields.insert("phone".into(), Value::String(String::new()));
        fields.insert("role".into(), Value::String(Role::Parent.to_string()));

        let record = self.store.create(&self.table, fields).await?;
        Ok(profile_from_record(record))
    }

    pub async fn update_fields(
        &self,
        record_id: &str,
        patch: UserFieldPatch,
    ) -> Result<UserProfile, StoreError> {
        let record = self
            .store
            .update(&self.table, record_id, patch.into_fields())
            .await?;
        Ok(profile_from_record(record))
    }

    /// Substring search over email and display name. The underlying table can
    /// hold duplicate rows for one identity, so results are deduplicated by
    /// uid, first occurrence wins.
    pub async fn search(&self, query: &str) -> Result<Vec<UserProfile>, StoreError> {
        let formula = Formula::or(vec![
            Formula::contains_ci("email", query),
            Formula::contains_ci("displayName", query),
        ]);
        let rows = self
            .store
            .list(&self.table, ListQuery::filtered(formula))
            .await?;

        let mut seen = std::collections::HashSet::new();
        let users = rows
            .into_iter()
            .map(profile_from_record)
            .filter(|profile| seen.insert(profile.uid.clone()))
            .collect();
        Ok(users)
    }
}

fn profile_from_record(record: Record) -> UserProfile {
    let role_text = record.str_field("role");
    let role = match role_text.parse::<Role>() {
        Ok(role) => role,
        Err(_) => {
            if !role_text.is_empty() {
                tracing::warn!(role = role_text, record = %record.id, "unknown role in store, treating as Parent");
            }
            Role::Parent
        }
    };

    UserProfile {
        uid: record.str_field("uid").to_string(),
        email: record.str_field("email").to_string(),
        display_name: record.str_field("displayName").to_string(),
        phone: record.str_field("phone").to_string(),
        role,
        updated_at: record
            .fields
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
        id: record.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn users_over(store: Arc<MemoryStore>) -> UserRecords {
        UserRecords::new(store, "Users")
    }

    #[tokio::test]
    async fn bootstrap_profile_gets_defaults() {
        let store = Arc::new(MemoryStore::new());
        let users = users_over(store.clone());

        let profile = users
            .create_profile("u1", "john.doe@x.com")
            .await
            .unwrap();

        assert_eq!(profile.display_name, "John Doe");
        assert_eq!(profile.phone, "");
        assert_eq!(profile.role, Role::Parent);

        let found = users.find_by_uid("u1").await.unwrap().unwrap();
        assert_eq!(found.id, profile.id);
    }

    #[tokio::test]
    async fn search_deduplicates_by_uid() {
        let store = Arc::new(MemoryStore::new());
        for _ in 0..2 {
            store.seed(
                "Users",
                json!({"uid": "u1", "email": "ann@x.com", "displayName": "Ann", "role": "Parent"})
                    .as_object()
                    .unwrap()
                    .clone(),
            );
        }
        let users = users_over(store);

        let found = users.search("ann").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uid, "u1");
    }

    #[tokio::test]
    async fn unknown_stored_role_reads_as_parent() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "Users",
            json!({"uid": "u9", "email": "x@x.com", "role": "Wizard"})
                .as_object()
                .unwrap()
                .clone(),
        );
        let users = users_over(store);

        let profile = users.find_by_uid("u9").await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Parent);
    }
}
