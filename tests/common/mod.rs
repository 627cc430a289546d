#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use httpmock::MockServer;

use recall_chat::config::{
    Config, OpenAiConfig, SearchConfig, SearchProviderKind, ServerConfig, StoreConfig,
};
use recall_chat::domains::conversation::PromptMessage;
use recall_chat::error::{RecallChatError, Result};
use recall_chat::interfaces::providers::{
    CompletionProvider, ExchangeStore, GenerationParams, HistoryQuery, RecordFields,
    SearchProvider, SearchResponse,
};

pub const BASE_ID: &str = "appTest";
pub const TABLE: &str = "Conversations";

pub fn table_path() -> String {
    format!("/v0/{BASE_ID}/{TABLE}")
}

/// Config whose three upstreams all point at `server`.
pub fn config_for(server: &MockServer, with_search: bool) -> Config {
    Config {
        openai: Some(OpenAiConfig {
            api_key: Some("sk-test-key".to_string()),
            base_url: Some(format!("{}/v1", server.base_url())),
            timeout_seconds: Some(5),
            ..Default::default()
        }),
        store: Some(StoreConfig {
            api_key: Some("pat-test".to_string()),
            base_id: Some(BASE_ID.to_string()),
            table_name: Some(TABLE.to_string()),
            base_url: Some(format!("{}/v0", server.base_url())),
            read_timeout_seconds: Some(5),
            write_timeout_seconds: Some(5),
            ..Default::default()
        }),
        search: Some(SearchConfig {
            enabled: Some(with_search),
            provider: Some(SearchProviderKind::Duckduckgo),
            base_url: Some(format!("{}/ddg", server.base_url())),
            timeout_seconds: Some(5),
            ..Default::default()
        }),
        server: Some(ServerConfig::default()),
    }
}

pub fn completion_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }
        ]
    })
}

pub fn params() -> GenerationParams {
    OpenAiConfig::default().generation_params()
}

/// Completion fake that remembers every prompt it was sent.
pub struct ScriptedCompletion {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<Vec<PromptMessage>>>,
}

impl ScriptedCompletion {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> Vec<PromptMessage> {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        _params: &GenerationParams,
    ) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(RecallChatError::Status {
                status: 503,
                body: "overloaded".to_string(),
            }),
        }
    }
}

/// Store fake: serves `history` newest-first and keeps every written row.
#[derive(Default)]
pub struct MemoryStore {
    pub history: Vec<RecordFields>,
    pub fail_reads: bool,
    pub written: Mutex<Vec<RecordFields>>,
    pub queries: Mutex<Vec<HistoryQuery>>,
}

impl MemoryStore {
    pub fn with_history(history: Vec<RecordFields>) -> Arc<Self> {
        Arc::new(Self {
            history,
            ..Default::default()
        })
    }

    pub fn written(&self) -> Vec<RecordFields> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeStore for MemoryStore {
    async fn list_records(&self, query: &HistoryQuery) -> Result<Vec<RecordFields>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_reads {
            return Err(RecallChatError::Http("connection refused".to_string()));
        }
        Ok(self
            .history
            .iter()
            .take(query.max_records)
            .cloned()
            .collect())
    }

    async fn create_record(&self, fields: &RecordFields) -> Result<()> {
        self.written.lock().unwrap().push(fields.clone());
        Ok(())
    }
}

pub struct ScriptedSearch {
    pub response: Option<SearchResponse>,
    pub queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn answering(response: SearchResponse) -> Arc<Self> {
        Arc::new(Self {
            response: Some(response),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: None,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &str, _max_results: usize) -> Result<SearchResponse> {
        self.queries.lock().unwrap().push(query.to_string());
        self.response.clone().ok_or_else(|| RecallChatError::Status {
            status: 500,
            body: "search down".to_string(),
        })
    }
}

pub fn question(text: &str) -> RecordFields {
    RecordFields {
        question: Some(text.to_string()),
        ..Default::default()
    }
}

pub fn response(text: &str) -> RecordFields {
    RecordFields {
        response: Some(text.to_string()),
        ..Default::default()
    }
}
