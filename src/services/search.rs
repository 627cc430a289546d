use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::domains::conversation::SearchDigest;
use crate::error::Result;
use crate::interfaces::providers::{InstantAnswer, SearchHit, SearchProvider, SearchResponse};
use crate::providers;
use crate::services::truncate_chars;

/// Words hinting that an answer needs current information.
pub const DEFAULT_TRIGGERS: &[&str] = &[
    // time
    "today",
    "tonight",
    "tomorrow",
    "yesterday",
    "this week",
    "right now",
    "current",
    "latest",
    "recent",
    "upcoming",
    // markets
    "price",
    "stock",
    "market",
    "bitcoin",
    "crypto",
    "exchange rate",
    // sports and news
    "score",
    "news",
    "headline",
    "election",
    "who won",
    "standings",
    // status
    "weather",
    "forecast",
    "open",
    "closed",
    "hours",
    "status",
    "outage",
    "traffic",
];

/// Case-insensitive substring gate deciding whether to consult search.
#[derive(Debug, Clone)]
pub struct SearchTrigger {
    terms: Vec<String>,
}

impl Default for SearchTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGERS.iter().copied())
    }
}

impl SearchTrigger {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { terms }
    }

    pub fn matches(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.terms.iter().any(|term| lowered.contains(term.as_str()))
    }
}

fn digest_from_instant_answer(
    answer: &InstantAnswer,
    max_results: usize,
    max_chars: usize,
) -> Option<SearchDigest> {
    let direct = [&answer.abstract_text, &answer.definition, &answer.answer]
        .into_iter()
        .find(|text| !text.trim().is_empty());
    if let Some(text) = direct {
        return SearchDigest::new(truncate_chars(text, max_chars));
    }

    let topics: Vec<&str> = answer
        .related_topics
        .iter()
        .filter(|topic| !topic.trim().is_empty())
        .take(max_results)
        .map(|topic| truncate_chars(topic, max_chars))
        .collect();
    SearchDigest::new(topics.join("\n"))
}

fn digest_from_hits(
    hits: &[SearchHit],
    max_results: usize,
    max_chars: usize,
) -> Option<SearchDigest> {
    let lines: Vec<String> = hits
        .iter()
        .filter_map(|hit| {
            let line = match (hit.title.trim(), hit.snippet.trim()) {
                ("", "") => return None,
                (title, "") => title.to_string(),
                ("", snippet) => snippet.to_string(),
                (title, snippet) => format!("{title}: {snippet}"),
            };
            Some(truncate_chars(&line, max_chars).to_string())
        })
        .take(max_results)
        .collect();
    SearchDigest::new(lines.join("\n"))
}

/// Reduces a provider response to a digest, or `None` when nothing usable came back.
pub fn digest_from_response(
    response: &SearchResponse,
    max_results: usize,
    max_chars: usize,
) -> Option<SearchDigest> {
    match response {
        SearchResponse::InstantAnswer(answer) => {
            digest_from_instant_answer(answer, max_results, max_chars)
        }
        SearchResponse::Results(hits) => digest_from_hits(hits, max_results, max_chars),
    }
}

pub struct SearchFetcher {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
    max_snippet_chars: usize,
}

impl SearchFetcher {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        max_results: usize,
        max_snippet_chars: usize,
    ) -> Self {
        Self {
            provider,
            max_results: max_results.max(1),
            max_snippet_chars,
        }
    }

    /// Advisory lookup: failures and empty results both come back as `None`.
    pub async fn fetch(&self, query: &str) -> Option<SearchDigest> {
        let started = Instant::now();
        match self.provider.search(query, self.max_results).await {
            Ok(response) => {
                let digest =
                    digest_from_response(&response, self.max_results, self.max_snippet_chars);
                debug!(
                    provider = self.provider.name(),
                    found = digest.is_some(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "search finished"
                );
                digest
            }
            Err(err) => {
                warn!(
                    provider = self.provider.name(),
                    error = %err.log_detail(),
                    "search failed"
                );
                None
            }
        }
    }
}

/// Trigger plus fetcher, built only when search is enabled.
pub struct WebSearch {
    trigger: SearchTrigger,
    fetcher: SearchFetcher,
}

impl WebSearch {
    pub fn new(trigger: SearchTrigger, fetcher: SearchFetcher) -> Self {
        Self { trigger, fetcher }
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let provider = providers::search::from_config(config)?;
        let trigger = match &config.triggers {
            Some(terms) => SearchTrigger::new(terms),
            None => SearchTrigger::default(),
        };
        let fetcher =
            SearchFetcher::new(provider, config.max_results(), config.max_snippet_chars());
        Ok(Self::new(trigger, fetcher))
    }

    pub fn should_search(&self, message: &str) -> bool {
        self.trigger.matches(message)
    }

    /// Digest for `message` when the trigger fires and the provider has something.
    pub async fn digest_for(&self, message: &str) -> Option<SearchDigest> {
        if !self.should_search(message) {
            return None;
        }
        info!("search triggered");
        self.fetcher.fetch(message).await
    }
}
