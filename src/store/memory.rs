//! In-process record store backend.
//!
//! Evaluates the same `Formula` AST the HTTP backend renders, so handler
//! logic behaves identically against either. Used for local development
//! (`STORE_BACKEND=memory`) and throughout the test suite.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{Map, Value};

use super::{ListQuery, Record, RecordStore, SortDirection, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Record>>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, bypassing the trait. Test and seed helper.
    pub fn seed(&self, table: &str, fields: Map<String, Value>) -> String {
        let mut inner = self.inner.lock().unwrap();
        let record = Self::new_record(&mut inner, fields);
        let id = record.id.clone();
        inner.tables.entry(table.to_string()).or_default().push(record);
        id
    }

    /// Snapshot of a table's rows, for assertions.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        let inner = self.inner.lock().unwrap();
        inner.tables.get(table).cloned().unwrap_or_default()
    }

    fn new_record(inner: &mut Inner, fields: Map<String, Value>) -> Record {
        inner.next_id += 1;
        Record {
            id: format!("rec{:06}", inner.next_id),
            fields,
            created_time: Some(Utc::now()),
        }
    }

    fn apply_query(mut rows: Vec<Record>, query: &ListQuery) -> Vec<Record> {
        if let Some(formula) = &query.formula {
            rows.retain(|r| formula.matches(&r.fields));
        }
        if let Some(sort) = &query.sort {
            rows.sort_by(|a, b| {
                let ordering = sort_key(a, &sort.field).cmp(&sort_key(b, &sort.field));
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(max) = query.max_records {
            rows.truncate(max);
        }
        rows
    }
}

// Rows carry creation time as record metadata rather than a field, so a sort
// on a missing field falls back to it.
fn sort_key(record: &Record, field: &str) -> String {
    match record.fields.get(field).and_then(Value::as_str) {
        Some(value) => value.to_string(),
        None => record
            .created_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, table: &str, query: ListQuery) -> Result<Vec<Record>, StoreError> {
        let rows = self.rows(table);
        Ok(Self::apply_query(rows, &query))
    }

    async fn find(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = Self::new_record(&mut inner, fields);
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let rows = inner.tables.get_mut(table).ok_or(StoreError::NotFound)?;
        let record = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        for (key, value) in fields {
            record.fields.insert(key, value);
        }
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Formula;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn list_filters_and_caps_results() {
        let store = MemoryStore::new();
        store.seed("Users", fields(json!({"uid": "u1", "email": "a@x.com"})));
        store.seed("Users", fields(json!({"uid": "u2", "email": "b@x.com"})));

        let matched = store
            .list("Users", ListQuery::first_match(Formula::eq("uid", "u2")))
            .await
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].str_field("email"), "b@x.com");
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::new();
        let id = store.seed("Users", fields(json!({"uid": "u1", "phone": ""})));

        store
            .update("Users", &id, fields(json!({"phone": "555-0100"})))
            .await
            .unwrap();

        let row = store.find("Users", &id).await.unwrap().unwrap();
        assert_eq!(row.str_field("phone"), "555-0100");
        assert_eq!(row.str_field("uid"), "u1");
    }

    #[tokio::test]
    async fn update_of_unknown_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("Users", "rec999999", Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
