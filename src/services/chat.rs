use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{RecallChatError, Result};
use crate::interfaces::providers::{CompletionProvider, ExchangeStore};
use crate::providers::airtable::AirtableStore;
use crate::providers::openai::OpenAiProvider;
use crate::services::composer::ResponseComposer;
use crate::services::history::HistoryFetcher;
use crate::services::recorder::ExchangeRecorder;
use crate::services::search::WebSearch;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub user_id: String,
    pub used_search: bool,
}

/// A finished turn. `recording` resolves once both store writes settle; dropping it leaves
/// the write running detached.
pub struct ChatTurn {
    pub reply: ChatReply,
    pub recording: JoinHandle<bool>,
}

pub struct ChatService {
    history: HistoryFetcher,
    search: Option<WebSearch>,
    composer: ResponseComposer,
    recorder: Arc<ExchangeRecorder>,
}

impl ChatService {
    pub fn new(
        history: HistoryFetcher,
        search: Option<WebSearch>,
        composer: ResponseComposer,
        recorder: ExchangeRecorder,
    ) -> Self {
        Self {
            history,
            search,
            composer,
            recorder: Arc::new(recorder),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let openai = config.openai();
        let store_config = config.store();
        let completion: Arc<dyn CompletionProvider> =
            Arc::new(OpenAiProvider::from_config(&openai)?);
        let store: Arc<dyn ExchangeStore> = Arc::new(AirtableStore::from_config(&store_config)?);
        let search = config
            .search()
            .map(|search| WebSearch::from_config(&search))
            .transpose()?;

        Ok(Self::new(
            HistoryFetcher::new(store.clone(), store_config.history_limit()),
            search,
            ResponseComposer::new(
                completion,
                openai.system_prompt(),
                openai.generation_params(),
            ),
            ExchangeRecorder::new(store, &store_config),
        ))
    }

    /// Runs one turn: history, optional search, completion, then a detached store write.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatTurn> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(RecallChatError::InvalidInput(
                "No message provided".to_string(),
            ));
        }
        let user_id = request
            .user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(user_id = %user_id, chars = message.chars().count(), "chat request");

        let history = self.history.fetch(&user_id).await;
        let digest = match &self.search {
            Some(search) => search.digest_for(message).await,
            None => None,
        };
        let response = self
            .composer
            .compose(message, &history, &user_id, digest.as_ref())
            .await;

        let recorder = self.recorder.clone();
        let record_user = user_id.clone();
        let question = message.to_string();
        let answer = response.clone();
        let recording = tokio::spawn(async move {
            let saved = recorder.record(&record_user, &question, &answer).await;
            if !saved {
                warn!(user_id = %record_user, "exchange was not saved");
            }
            saved
        });

        Ok(ChatTurn {
            reply: ChatReply {
                response,
                user_id,
                used_search: digest.is_some(),
            },
            recording,
        })
    }
}
