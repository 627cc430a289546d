use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domains::conversation::PromptMessage;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends the ordered prompt and returns the generated text.
    async fn complete(&self, messages: &[PromptMessage], params: &GenerationParams)
        -> Result<String>;
}

/// Field bag of one stored row. Absent fields are left out of the write payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub user_id: String,
    pub sort_field: String,
    pub direction: SortDirection,
    pub max_records: usize,
}

impl HistoryQuery {
    /// Newest-first listing of one user's rows.
    pub fn latest_for(user_id: &str, max_records: usize) -> Self {
        Self {
            user_id: user_id.to_string(),
            sort_field: "timestamp".to_string(),
            direction: SortDirection::Desc,
            max_records,
        }
    }
}

#[async_trait]
pub trait ExchangeStore: Send + Sync {
    async fn list_records(&self, query: &HistoryQuery) -> Result<Vec<RecordFields>>;
    async fn create_record(&self, fields: &RecordFields) -> Result<()>;
}

/// Flat instant-answer payload: each field is empty when the provider had nothing for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstantAnswer {
    pub abstract_text: String,
    pub definition: String,
    pub answer: String,
    pub related_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResponse {
    InstantAnswer(InstantAnswer),
    Results(Vec<SearchHit>),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse>;
}
