use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};

use crate::config::OpenAiConfig;
use crate::domains::conversation::{PromptMessage, PromptRole};
use crate::error::{RecallChatError, Result};
use crate::interfaces::providers::{CompletionProvider, GenerationParams};

#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: Option<String>, timeout_seconds: u64) -> Self {
        let base_url = base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            timeout: Duration::from_secs(timeout_seconds.max(1)),
        }
    }

    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RecallChatError::Config("openai.api_key is required".to_string()))?;
        Ok(Self::new(
            api_key,
            Some(config.base_url()),
            config.timeout_seconds(),
        ))
    }

    fn build_message(message: &PromptMessage) -> Result<ChatCompletionRequestMessage> {
        let built = match message.role {
            PromptRole::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map(ChatCompletionRequestMessage::System),
            PromptRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Text(
                    message.content.clone(),
                ))
                .build()
                .map(ChatCompletionRequestMessage::User),
            PromptRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map(ChatCompletionRequestMessage::Assistant),
        };
        built.map_err(|e| RecallChatError::Runtime(e.to_string()))
    }

    #[allow(deprecated)]
    fn build_request(
        messages: &[PromptMessage],
        params: &GenerationParams,
    ) -> Result<CreateChatCompletionRequest> {
        let messages = messages
            .iter()
            .map(Self::build_message)
            .collect::<Result<Vec<_>>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(params.model.clone());
        builder.messages(messages);
        builder.max_tokens(params.max_tokens);
        builder.temperature(params.temperature);
        if let Some(penalty) = params.presence_penalty {
            builder.presence_penalty(penalty);
        }
        if let Some(penalty) = params.frequency_penalty {
            builder.frequency_penalty(penalty);
        }

        builder
            .build()
            .map_err(|e| RecallChatError::Runtime(e.to_string()))
    }

    fn extract_text_from_value(response: &Value) -> Option<String> {
        response
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        params: &GenerationParams,
    ) -> Result<String> {
        let request = Self::build_request(messages, params)?;
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| RecallChatError::Http(format!("chat completion transport failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecallChatError::Http(format!("chat completion read failed: {e}")))?;

        if status != StatusCode::OK {
            return Err(RecallChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)?;
        Self::extract_text_from_value(&value).ok_or_else(|| {
            RecallChatError::Serialization("chat completion had no message content".to_string())
        })
    }
}
