//! Record-store collaborator.
//!
//! The portal's only persistence is a hosted spreadsheet-style table API.
//! `RecordStore` is the narrow seam over it: field-filtered list queries and
//! single-record create/update, all eventually consistent on the provider's
//! side. `HttpRecordStore` talks to the real service; `MemoryStore` backs
//! local development and tests.

pub mod changelog;
pub mod formula;
pub mod http;
pub mod issues;
pub mod memory;
pub mod users;

pub use changelog::ChangeLog;
pub use formula::Formula;
pub use http::HttpRecordStore;
pub use issues::IssueRecords;
pub use memory::MemoryStore;
pub use users::UserRecords;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One row in a table: provider-assigned id plus a loose field map.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: String,
    pub fields: Map<String, Value>,
    pub created_time: Option<DateTime<Utc>>,
}

impl Record {
    pub fn str_field(&self, name: &str) -> &str {
        self.fields.get(name).and_then(Value::as_str).unwrap_or("")
    }

    pub fn bool_field(&self, name: &str) -> bool {
        self.fields.get(name).and_then(Value::as_bool).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Options for a list query. `None` formula means "all rows".
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub formula: Option<Formula>,
    pub max_records: Option<usize>,
    pub sort: Option<Sort>,
}

impl ListQuery {
    pub fn filtered(formula: Formula) -> Self {
        Self { formula: Some(formula), ..Self::default() }
    }

    pub fn first_match(formula: Formula) -> Self {
        Self {
            formula: Some(formula),
            max_records: Some(1),
            sort: None,
        }
    }

    pub fn newest_first(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            direction: SortDirection::Desc,
        });
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("record store rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected record store response: {0}")]
    Decode(String),
}

/// The external table API, reduced to what the portal uses.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, table: &str, query: ListQuery) -> Result<Vec<Record>, StoreError>;

    async fn find(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError>;

    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError>;

    async fn update(
        &self,
        table: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError>;
}
