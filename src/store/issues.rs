//! Typed access to the Issues table.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Formula, ListQuery, Record, RecordStore, StoreError};
use crate::types::Issue;

#[derive(Clone)]
pub struct IssueRecords {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl IssueRecords {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self { store, table: table.into() }
    }

    pub async fn create(&self, title: &str, description: &str) -> Result<Issue, StoreError> {
        let mut fields = Map::new();
        fields.insert("issue".into(), Value::String(title.to_string()));
        fields.insert("description".into(), Value::String(description.to_string()));
        fields.insert("resolved".into(), Value::Bool(false));

        let record = self.store.create(&self.table, fields).await?;
        Ok(issue_from_record(record))
    }

    /// Open issues, or the full history when `include_resolved`. Rows with a
    /// blank title are filtered out either way; newest first.
    pub async fn list(&self, include_resolved: bool) -> Result<Vec<Issue>, StoreError> {
        let formula = if include_resolved {
            Formula::not_blank("issue")
        } else {
            Formula::and(vec![
                Formula::not_blank("issue"),
                Formula::is_false("resolved"),
            ])
        };
        let rows = self
            .store
            .list(&self.table, ListQuery::filtered(formula).newest_first("createdAt"))
            .await?;
        Ok(rows.into_iter().map(issue_from_record).collect())
    }

    pub async fn find(&self, id: &str) -> Result<Option<Issue>, StoreError> {
        let record = self.store.find(&self.table, id).await?;
        Ok(record.map(issue_from_record))
    }

    /// Flip the resolved flag to true. Monotonic: an already-resolved issue
    /// is returned unchanged without touching the store.
    pub async fn resolve(&self, id: &str) -> Result<Option<Issue>, StoreError> {
        let Some(existing) = self.find(id).await? else {
            return Ok(None);
        };
        if existing.resolved {
            return Ok(Some(existing));
        }

        let mut fields = Map::new();
        fields.insert("resolved".into(), Value::Bool(true));
        let record = self.store.update(&self.table, id, fields).await?;
        Ok(Some(issue_from_record(record)))
    }
}

fn issue_from_record(record: Record) -> Issue {
    Issue {
        issue: record.str_field("issue").to_string(),
        description: record.str_field("description").to_string(),
        resolved: record.bool_field("resolved"),
        created_at: record
            .fields
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .or(record.created_time),
        id: record.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn seed_issue(store: &MemoryStore, title: &str, resolved: bool) -> String {
        store.seed(
            "Issues",
            json!({"issue": title, "description": "d", "resolved": resolved})
                .as_object()
                .unwrap()
                .clone(),
        )
    }

    #[tokio::test]
    async fn list_excludes_resolved_and_blank_titles() {
        let store = Arc::new(MemoryStore::new());
        seed_issue(&store, "Projector broken", false);
        seed_issue(&store, "Old outage", true);
        seed_issue(&store, "", false);
        let issues = IssueRecords::new(store, "Issues");

        let open = issues.list(false).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].issue, "Projector broken");

        let all = issues.list(true).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn resolve_is_monotonic() {
        let store = Arc::new(MemoryStore::new());
        let id = seed_issue(&store, "Wifi down", false);
        let issues = IssueRecords::new(store.clone(), "Issues");

        let resolved = issues.resolve(&id).await.unwrap().unwrap();
        assert!(resolved.resolved);

        // Second resolve is a no-op read
        let again = issues.resolve(&id).await.unwrap().unwrap();
        assert!(again.resolved);

        assert!(issues.resolve("rec_missing").await.unwrap().is_none());
    }
}
