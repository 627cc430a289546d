use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{SearchConfig, SearchProviderKind};
use crate::error::{RecallChatError, Result};
use crate::interfaces::providers::{InstantAnswer, SearchHit, SearchProvider, SearchResponse};

pub fn from_config(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>> {
    let timeout = Duration::from_secs(config.timeout_seconds().max(1));
    match config.provider() {
        SearchProviderKind::Duckduckgo => Ok(Arc::new(DuckDuckGoSearch::new(
            config.base_url(),
            timeout,
        ))),
        SearchProviderKind::Brave => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    RecallChatError::Config("search.api_key is required for brave".to_string())
                })?;
            Ok(Arc::new(BraveSearch::new(api_key, config.base_url(), timeout)))
        }
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(RecallChatError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

#[derive(Debug, Default, Deserialize)]
struct DuckDuckGoPayload {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "Definition", default)]
    definition: String,
    #[serde(rename = "Answer", default)]
    answer: Value,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<Value>,
}

impl DuckDuckGoPayload {
    /// Topic texts in listed order, descending into grouped topics.
    fn topic_texts(topics: &[Value], out: &mut Vec<String>) {
        for topic in topics {
            if let Some(text) = topic.get("Text").and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    out.push(text.trim().to_string());
                }
            } else if let Some(nested) = topic.get("Topics").and_then(|v| v.as_array()) {
                Self::topic_texts(nested, out);
            }
        }
    }

    fn into_instant_answer(self, max_results: usize) -> InstantAnswer {
        let answer = match &self.answer {
            Value::String(text) => text.clone(),
            _ => String::new(),
        };
        let mut related = Vec::new();
        Self::topic_texts(&self.related_topics, &mut related);
        related.truncate(max_results);

        InstantAnswer {
            abstract_text: self.abstract_text.trim().to_string(),
            definition: self.definition.trim().to_string(),
            answer: answer.trim().to_string(),
            related_topics: related,
        }
    }
}

/// Instant-answer lookups; needs no key.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl DuckDuckGoSearch {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            timeout,
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let payload: DuckDuckGoPayload = serde_json::from_str(&body)?;
        Ok(SearchResponse::InstantAnswer(
            payload.into_instant_answer(max_results),
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
struct BravePayload {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Default, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Default, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Web results as title/snippet pairs; requires a subscription token.
pub struct BraveSearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl BraveSearch {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            timeout,
        }
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    fn name(&self) -> &str {
        "brave"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResponse> {
        let url = format!("{}/web/search", self.base_url.trim_end_matches('/'));
        let count = max_results.max(1).to_string();
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let payload: BravePayload = serde_json::from_str(&body)?;
        let hits = payload
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .map(|result| SearchHit {
                title: strip_markup(&result.title),
                snippet: strip_markup(&result.description),
            })
            .filter(|hit| !hit.title.is_empty() || !hit.snippet.is_empty())
            .take(max_results)
            .collect();
        Ok(SearchResponse::Results(hits))
    }
}
