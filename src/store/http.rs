//! HTTP backend for the hosted record store.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{ListQuery, Record, RecordStore, SortDirection, StoreError};
use crate::config::StoreConfig;

pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: url::Url,
    base_id: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(rename = "createdTime")]
    created_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<WireRecord> for Record {
    fn from(wire: WireRecord) -> Self {
        Record {
            id: wire.id,
            fields: wire.fields,
            created_time: wire.created_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<WireRecord>,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    records: Vec<WireRecord>,
}

impl HttpRecordStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| StoreError::Decode(format!("invalid store base url: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            base_id: config.base_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str, id: Option<&str>) -> Result<url::Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::Decode("store base url cannot be a base".into()))?;
            segments.push(&self.base_id).push(table);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }
        let message = match response.json::<Value>().await {
            Ok(body) => body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("no error message")
                .to_string(),
            Err(_) => "no error message".to_string(),
        };
        Err(StoreError::Api { status: status.as_u16(), message })
    }
}

#[async_trait::async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(&self, table: &str, query: ListQuery) -> Result<Vec<Record>, StoreError> {
        let mut url = self.table_url(table, None)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(formula) = &query.formula {
                pairs.append_pair("filterByFormula", &formula.render());
            }
            if let Some(max) = query.max_records {
                pairs.append_pair("maxRecords", &max.to_string());
            }
            if let Some(sort) = &query.sort {
                pairs.append_pair("sort[0][field]", &sort.field);
                let direction = match sort.direction {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                };
                pairs.append_pair("sort[0][direction]", direction);
            }
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body: ListResponse = self.check(response).await?.json().await?;
        Ok(body.records.into_iter().map(Record::from).collect())
    }

    async fn find(&self, table: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let url = self.table_url(table, Some(id))?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        match self.check(response).await {
            Ok(ok) => Ok(Some(ok.json::<WireRecord>().await?.into())),
            Err(StoreError::NotFound) => Ok(None),
            Err(other) => Err(other),
        }
    }

    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, StoreError> {
        let url = self.table_url(table, None)?;
        let body = json!({ "records": [{ "fields": fields }] });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let mut batch: BatchResponse = self.check(response).await?.json().await?;
        match batch.records.pop() {
            Some(record) if batch.records.is_empty() => Ok(record.into()),
            _ => Err(StoreError::Decode("create returned unexpected batch size".into())),
        }
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let url = self.table_url(table, Some(id))?;
        let body = json!({ "fields": fields });

        let response = self
            .client
            .patch(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let record: WireRecord = self.check(response).await?.json().await?;
        Ok(record.into())
    }
}
