use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{RecallChatError, Result};
use crate::interfaces::providers::GenerationParams;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant with memory. Use conversation history to provide contextual responses. Be friendly and remember details from previous messages.";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub timeout_seconds: Option<u64>,
    pub system_prompt: Option<String>,
}

impl OpenAiConfig {
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| "gpt-3.5-turbo".to_string())
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(30)
    }

    pub fn system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            model: self.model(),
            max_tokens: self.max_tokens.unwrap_or(300),
            temperature: self.temperature.unwrap_or(0.7),
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub table_name: Option<String>,
    pub base_url: Option<String>,
    pub read_timeout_seconds: Option<u64>,
    pub write_timeout_seconds: Option<u64>,
    pub bot_id: Option<String>,
    pub tags: Option<String>,
    pub history_limit: Option<usize>,
    pub max_response_chars: Option<usize>,
    pub max_question_chars: Option<usize>,
}

impl StoreConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| "https://api.airtable.com/v0".to_string())
    }

    pub fn read_timeout_seconds(&self) -> u64 {
        self.read_timeout_seconds.unwrap_or(10)
    }

    pub fn write_timeout_seconds(&self) -> u64 {
        self.write_timeout_seconds.unwrap_or(15)
    }

    pub fn bot_id(&self) -> String {
        self.bot_id
            .clone()
            .unwrap_or_else(|| "recall_chat_web".to_string())
    }

    pub fn tags(&self) -> String {
        self.tags.clone().unwrap_or_else(|| "web_chat".to_string())
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit.unwrap_or(5)
    }

    pub fn max_response_chars(&self) -> usize {
        self.max_response_chars.unwrap_or(1000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchProviderKind {
    #[default]
    Duckduckgo,
    Brave,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchConfig {
    pub enabled: Option<bool>,
    pub provider: Option<SearchProviderKind>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_results: Option<usize>,
    pub max_snippet_chars: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub triggers: Option<Vec<String>>,
}

impl SearchConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn provider(&self) -> SearchProviderKind {
        self.provider.unwrap_or_default()
    }

    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.clone();
        }
        match self.provider() {
            SearchProviderKind::Duckduckgo => "https://api.duckduckgo.com".to_string(),
            SearchProviderKind::Brave => "https://api.search.brave.com/res/v1".to_string(),
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results.unwrap_or(3).max(1)
    }

    pub fn max_snippet_chars(&self) -> usize {
        self.max_snippet_chars.unwrap_or(300)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(10)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ServerConfig {
    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| "0.0.0.0".to_string())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(5001)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub openai: Option<OpenAiConfig>,
    pub store: Option<StoreConfig>,
    pub search: Option<SearchConfig>,
    pub server: Option<ServerConfig>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RecallChatError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| RecallChatError::Config(e.to_string()))
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from named variables; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let openai = OpenAiConfig {
            api_key: get("OPENAI_API_KEY"),
            model: get("OPENAI_MODEL"),
            base_url: get("OPENAI_BASE_URL"),
            ..Default::default()
        };
        let store = StoreConfig {
            api_key: get("AIRTABLE_API_KEY"),
            base_id: get("AIRTABLE_BASE_ID"),
            table_name: get("AIRTABLE_TABLE_NAME"),
            base_url: get("AIRTABLE_BASE_URL"),
            ..Default::default()
        };

        let search_enabled = get("SEARCH_ENABLED").map(|value| {
            !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
        });
        let provider = get("SEARCH_PROVIDER").and_then(|value| {
            match value.trim().to_ascii_lowercase().as_str() {
                "duckduckgo" => Some(SearchProviderKind::Duckduckgo),
                "brave" => Some(SearchProviderKind::Brave),
                other => {
                    tracing::warn!(provider = other, "unknown SEARCH_PROVIDER, using default");
                    None
                }
            }
        });
        let search = SearchConfig {
            enabled: search_enabled,
            provider,
            api_key: get("SEARCH_API_KEY"),
            ..Default::default()
        };

        let server = ServerConfig {
            host: get("HOST"),
            port: get("PORT").and_then(|value| value.trim().parse().ok()),
        };

        Self {
            openai: Some(openai),
            store: Some(store),
            search: Some(search),
            server: Some(server),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let openai = self
            .openai
            .as_ref()
            .ok_or_else(|| RecallChatError::Config("missing openai section".to_string()))?;
        require("openai.api_key", openai.api_key.as_deref())?;

        let store = self
            .store
            .as_ref()
            .ok_or_else(|| RecallChatError::Config("missing store section".to_string()))?;
        require("store.api_key", store.api_key.as_deref())?;
        require("store.base_id", store.base_id.as_deref())?;
        require("store.table_name", store.table_name.as_deref())?;

        if let Some(search) = self.search.as_ref().filter(|search| search.enabled()) {
            if search.provider() == SearchProviderKind::Brave {
                require("search.api_key", search.api_key.as_deref())?;
            }
        }
        Ok(())
    }

    pub fn openai(&self) -> OpenAiConfig {
        self.openai.clone().unwrap_or_default()
    }

    pub fn store(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }

    /// Search settings, or `None` when search is switched off.
    pub fn search(&self) -> Option<SearchConfig> {
        self.search.clone().filter(|search| search.enabled())
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }
}

fn require(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(RecallChatError::Config(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        let params = config.openai().generation_params();
        assert_eq!(params.model, "gpt-3.5-turbo");
        assert_eq!(params.max_tokens, 300);
        assert!((params.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(params.presence_penalty, None);

        let store = config.store();
        assert_eq!(store.history_limit(), 5);
        assert_eq!(store.max_response_chars(), 1000);
        assert_eq!(store.read_timeout_seconds(), 10);
        assert_eq!(store.write_timeout_seconds(), 15);
        assert_eq!(config.server().port(), 5001);
        assert!(config.search().is_none());
    }

    #[test]
    fn from_lookup_reads_provider_variables() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AIRTABLE_API_KEY", "pat"),
            ("AIRTABLE_BASE_ID", "app1"),
            ("AIRTABLE_TABLE_NAME", "Chats"),
            ("SEARCH_PROVIDER", "brave"),
            ("SEARCH_API_KEY", "brave-key"),
            ("PORT", "8080"),
        ]));
        config.validate().unwrap();
        assert_eq!(config.openai().api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.store().table_name.as_deref(), Some("Chats"));
        let search = config.search().unwrap();
        assert_eq!(search.provider(), SearchProviderKind::Brave);
        assert_eq!(search.base_url(), "https://api.search.brave.com/res/v1");
        assert_eq!(config.server().port(), 8080);
    }

    #[test]
    fn search_can_be_switched_off_from_env() {
        let config = Config::from_lookup(lookup_from(&[("SEARCH_ENABLED", "false")]));
        assert!(config.search().is_none());
    }

    #[test]
    fn validate_names_the_missing_field() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AIRTABLE_API_KEY", "pat"),
            ("AIRTABLE_TABLE_NAME", "Chats"),
        ]));
        match config.validate() {
            Err(RecallChatError::Config(message)) => assert!(message.contains("store.base_id")),
            other => panic!("expected config error, got {other:?}"),
        }

        let brave_without_key = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AIRTABLE_API_KEY", "pat"),
            ("AIRTABLE_BASE_ID", "app1"),
            ("AIRTABLE_TABLE_NAME", "Chats"),
            ("SEARCH_PROVIDER", "brave"),
        ]));
        assert!(matches!(
            brave_without_key.validate(),
            Err(RecallChatError::Config(_))
        ));
    }

    #[test]
    fn blank_system_prompt_falls_back_to_default() {
        let openai = OpenAiConfig {
            system_prompt: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(openai.system_prompt(), DEFAULT_SYSTEM_PROMPT);
    }
}
