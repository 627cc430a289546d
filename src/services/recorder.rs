use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::domains::conversation::Exchange;
use crate::interfaces::providers::{ExchangeStore, RecordFields};
use crate::services::truncate_chars;

pub struct ExchangeRecorder {
    store: Arc<dyn ExchangeStore>,
    bot_id: String,
    tags: String,
    max_response_chars: usize,
    max_question_chars: Option<usize>,
}

impl ExchangeRecorder {
    pub fn new(store: Arc<dyn ExchangeStore>, config: &StoreConfig) -> Self {
        Self {
            store,
            bot_id: config.bot_id(),
            tags: config.tags(),
            max_response_chars: config.max_response_chars(),
            max_question_chars: config.max_question_chars,
        }
    }

    /// Applies the store's field limits and stamps both halves with one timestamp.
    pub fn build_exchange(
        &self,
        user_id: &str,
        question: &str,
        response: &str,
        timestamp: DateTime<Utc>,
    ) -> Exchange {
        let question = match self.max_question_chars {
            Some(max) => truncate_chars(question, max),
            None => question,
        };
        Exchange {
            user_id: user_id.to_string(),
            timestamp,
            question: question.to_string(),
            response: truncate_chars(response, self.max_response_chars).to_string(),
            bot_id: self.bot_id.clone(),
            tags: self.tags.clone(),
        }
    }

    /// The question row and the response row for one exchange.
    pub fn records_for(exchange: &Exchange) -> [RecordFields; 2] {
        let base = RecordFields {
            timestamp: Some(
                exchange
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ),
            user_id: Some(exchange.user_id.clone()),
            bot_id: Some(exchange.bot_id.clone()),
            tags: Some(exchange.tags.clone()),
            ..Default::default()
        };
        [
            RecordFields {
                question: Some(exchange.question.clone()),
                ..base.clone()
            },
            RecordFields {
                response: Some(exchange.response.clone()),
                ..base
            },
        ]
    }

    /// Writes both rows; true only when the store accepted each of them.
    pub async fn record(&self, user_id: &str, question: &str, response: &str) -> bool {
        let exchange = self.build_exchange(user_id, question, response, Utc::now());
        let [question_row, response_row] = Self::records_for(&exchange);

        let question_saved = self.write(user_id, "question", &question_row).await;
        let response_saved = self.write(user_id, "response", &response_row).await;

        let saved = question_saved && response_saved;
        if saved {
            debug!(user_id, "exchange recorded");
        } else {
            warn!(
                user_id,
                question_saved,
                response_saved,
                "failed to record exchange"
            );
        }
        saved
    }

    async fn write(&self, user_id: &str, kind: &str, fields: &RecordFields) -> bool {
        match self.store.create_record(fields).await {
            Ok(()) => true,
            Err(err) => {
                warn!(user_id, kind, error = %err.log_detail(), "store write failed");
                false
            }
        }
    }
}
