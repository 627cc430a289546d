use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::domains::conversation::ConversationTurn;
use crate::interfaces::providers::{ExchangeStore, HistoryQuery, RecordFields};

/// Upper bound on turns replayed from the store.
pub const MAX_TRANSCRIPT_TURNS: usize = 10;

/// Question rows sort ahead of response-only rows.
fn speaker_rank(fields: &RecordFields) -> u8 {
    let has_question = fields.question.as_deref().is_some_and(|text| !text.is_empty());
    u8::from(!has_question)
}

/// Turns newest-first store rows into an oldest-first transcript of at most
/// [`MAX_TRANSCRIPT_TURNS`] turns. A row yields its question before its response.
///
/// Both rows of an exchange carry the same timestamp, so the store may return them in
/// either order; within a run of equal timestamps questions are placed first.
pub fn reconstruct_transcript(records_newest_first: Vec<RecordFields>) -> Vec<ConversationTurn> {
    let mut rows: Vec<RecordFields> = records_newest_first.into_iter().rev().collect();
    for tied in rows.chunk_by_mut(|a, b| a.timestamp.is_some() && a.timestamp == b.timestamp) {
        tied.sort_by_key(speaker_rank);
    }

    let mut transcript = Vec::with_capacity(rows.len() * 2);
    for fields in rows {
        if let Some(question) = fields.question.filter(|text| !text.is_empty()) {
            transcript.push(ConversationTurn::user(question));
        }
        if let Some(response) = fields.response.filter(|text| !text.is_empty()) {
            transcript.push(ConversationTurn::assistant(response));
        }
    }

    let excess = transcript.len().saturating_sub(MAX_TRANSCRIPT_TURNS);
    transcript.drain(..excess);
    transcript
}

pub struct HistoryFetcher {
    store: Arc<dyn ExchangeStore>,
    limit: usize,
}

impl HistoryFetcher {
    pub fn new(store: Arc<dyn ExchangeStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Recent turns for `user_id`; any store failure reads as an empty history.
    pub async fn fetch(&self, user_id: &str) -> Vec<ConversationTurn> {
        let started = Instant::now();
        let query = HistoryQuery::latest_for(user_id, self.limit.saturating_mul(2));
        match self.store.list_records(&query).await {
            Ok(records) => {
                let transcript = reconstruct_transcript(records);
                debug!(
                    user_id,
                    turns = transcript.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "history fetched"
                );
                transcript
            }
            Err(err) => {
                warn!(
                    user_id,
                    error = %err.log_detail(),
                    "history unavailable, continuing without it"
                );
                Vec::new()
            }
        }
    }
}
