use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::domains::conversation::{ConversationTurn, PromptMessage, SearchDigest};
use crate::interfaces::providers::{CompletionProvider, GenerationParams};

/// Prior turns replayed into each prompt.
pub const HISTORY_WINDOW: usize = 6;

pub const FALLBACK_RESPONSE: &str =
    "I'm having trouble generating a response right now. Please try again.";

/// Final user content: the message alone, or the message followed by the digest and an
/// instruction to use it.
pub fn user_content(message: &str, digest: Option<&SearchDigest>) -> String {
    match digest {
        None => message.to_string(),
        Some(digest) => format!(
            "{message}\n\nCurrent information from a web search:\n{}\n\nPlease incorporate this information into your answer where it is relevant.",
            digest.as_str()
        ),
    }
}

/// System persona, the last [`HISTORY_WINDOW`] turns, then the current message.
pub fn build_prompt(
    system_prompt: &str,
    history: &[ConversationTurn],
    message: &str,
    digest: Option<&SearchDigest>,
) -> Vec<PromptMessage> {
    let window_start = history.len().saturating_sub(HISTORY_WINDOW);
    let window = &history[window_start..];

    let mut prompt = Vec::with_capacity(window.len() + 2);
    prompt.push(PromptMessage::system(system_prompt));
    prompt.extend(window.iter().map(PromptMessage::from));
    prompt.push(PromptMessage::user(user_content(message, digest)));
    prompt
}

pub struct ResponseComposer {
    provider: Arc<dyn CompletionProvider>,
    system_prompt: String,
    params: GenerationParams,
}

impl ResponseComposer {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        system_prompt: String,
        params: GenerationParams,
    ) -> Self {
        Self {
            provider,
            system_prompt,
            params,
        }
    }

    /// Generated reply, or [`FALLBACK_RESPONSE`] when the provider fails.
    pub async fn compose(
        &self,
        message: &str,
        history: &[ConversationTurn],
        user_id: &str,
        digest: Option<&SearchDigest>,
    ) -> String {
        let prompt = build_prompt(&self.system_prompt, history, message, digest);
        let started = Instant::now();
        match self.provider.complete(&prompt, &self.params).await {
            Ok(text) => {
                info!(
                    user_id,
                    prompt_messages = prompt.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "completion generated"
                );
                text
            }
            Err(err) => {
                warn!(
                    user_id,
                    model = %self.params.model,
                    error = %err.log_detail(),
                    "completion failed, using fallback"
                );
                FALLBACK_RESPONSE.to_string()
            }
        }
    }
}
