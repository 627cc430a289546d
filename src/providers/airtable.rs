use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::StoreConfig;
use crate::error::{RecallChatError, Result};
use crate::interfaces::providers::{ExchangeStore, HistoryQuery, RecordFields};

#[derive(Debug, Deserialize)]
struct ListRecordsResponse {
    #[serde(default)]
    records: Vec<StoredRecord>,
}

#[derive(Debug, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    fields: RecordFields,
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    fields: &'a RecordFields,
}

#[derive(Clone)]
pub struct AirtableStore {
    client: reqwest::Client,
    api_key: String,
    table_url: Url,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl AirtableStore {
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let api_key = required(config.api_key.as_deref(), "store.api_key")?;
        let base_id = required(config.base_id.as_deref(), "store.base_id")?;
        let table_name = required(config.table_name.as_deref(), "store.table_name")?;
        let table_url = Self::table_url(&config.base_url(), &base_id, &table_name)?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            table_url,
            read_timeout: Duration::from_secs(config.read_timeout_seconds().max(1)),
            write_timeout: Duration::from_secs(config.write_timeout_seconds().max(1)),
        })
    }

    fn table_url(base_url: &str, base_id: &str, table_name: &str) -> Result<Url> {
        let mut url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| RecallChatError::Config(format!("invalid store.base_url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| RecallChatError::Config("store.base_url cannot be a base".to_string()))?
            .push(base_id)
            .push(table_name);
        Ok(url)
    }

    /// Formula matching rows owned by `user_id`, with quotes escaped.
    pub fn user_filter_formula(user_id: &str) -> String {
        let escaped = user_id.replace('\\', "\\\\").replace('\'', "\\'");
        format!("{{user_id}} = '{escaped}'")
    }

    fn list_params(query: &HistoryQuery) -> Vec<(&'static str, String)> {
        vec![
            ("filterByFormula", Self::user_filter_formula(&query.user_id)),
            ("sort[0][field]", query.sort_field.clone()),
            ("sort[0][direction]", query.direction.as_str().to_string()),
            ("maxRecords", query.max_records.to_string()),
        ]
    }
}

fn required(value: Option<&str>, field: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RecallChatError::Config(format!("{field} is required")))
}

#[async_trait]
impl ExchangeStore for AirtableStore {
    async fn list_records(&self, query: &HistoryQuery) -> Result<Vec<RecordFields>> {
        let response = self
            .client
            .get(self.table_url.clone())
            .bearer_auth(&self.api_key)
            .query(&Self::list_params(query))
            .timeout(self.read_timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RecallChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let listing: ListRecordsResponse = response
            .json()
            .await
            .map_err(|e| RecallChatError::Serialization(e.to_string()))?;
        Ok(listing
            .records
            .into_iter()
            .map(|record| record.fields)
            .collect())
    }

    async fn create_record(&self, fields: &RecordFields) -> Result<()> {
        let response = self
            .client
            .post(self.table_url.clone())
            .bearer_auth(&self.api_key)
            .json(&CreateRecordRequest { fields })
            .timeout(self.write_timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RecallChatError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
