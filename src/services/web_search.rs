use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::llm::{CompletionRequest, GroqProvider, LlmProvider, ProviderError};

const GOOGLE_CSE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com/";
const SEARCH_USER_AGENT: &str = "Mozilla/5.0 (compatible; DigitalIndiaBot/1.0)";
const SEARCH_TIMEOUT_SECS: u64 = 10;

const GROQ_SEARCH_SYSTEM: &str = "You are a web search assistant. Search for and provide current information about the query. Return results in a structured format with title, snippet, and source.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub source: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError>;
}

fn search_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
        .user_agent(SEARCH_USER_AGENT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn ensure_success(response: &reqwest::Response) -> Result<(), ProviderError> {
    let status = response.status();
    match status.as_u16() {
        200..=299 => Ok(()),
        429 => Err(ProviderError::RateLimited),
        code => Err(ProviderError::Upstream { status: code }),
    }
}

pub struct GoogleSearch {
    api_key: Option<String>,
    engine_id: Option<String>,
    client: reqwest::Client,
}

impl GoogleSearch {
    pub fn new(api_key: Option<String>, engine_id: Option<String>) -> Self {
        Self {
            api_key,
            engine_id,
            client: search_client(),
        }
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    fn name(&self) -> &'static str {
        "Google"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let (Some(key), Some(cx)) = (self.api_key.as_deref(), self.engine_id.as_deref()) else {
            return Err(ProviderError::NotConfigured);
        };

        let url = format!(
            "{}?key={}&cx={}&q={}&num=5",
            GOOGLE_CSE_URL,
            urlencoding::encode(key),
            urlencoding::encode(cx),
            urlencoding::encode(query)
        );

        let response = self.client.get(&url).send().await?;
        ensure_success(&response)?;
        let data: serde_json::Value = response.json().await?;

        Ok(data["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| SearchResult {
                        title: item["title"].as_str().unwrap_or_default().to_string(),
                        snippet: item["snippet"].as_str().unwrap_or_default().to_string(),
                        url: item["link"].as_str().unwrap_or_default().to_string(),
                        source: "Google".to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Asks Groq to act as a search engine and parses its numbered list.
pub struct GroqSearch {
    groq: Arc<GroqProvider>,
}

impl GroqSearch {
    pub fn new(groq: Arc<GroqProvider>) -> Self {
        Self { groq }
    }
}

/// `N. Title` lines open a result; following non-blank lines extend its snippet.
pub fn parse_numbered_results(content: &str) -> Vec<SearchResult> {
    let mut results = Vec::new();
    let mut current: Option<SearchResult> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();

        if digits > 0 && line[digits..].starts_with('.') {
            if let Some(done) = current.take() {
                results.push(done);
            }
            current = Some(SearchResult {
                title: line[digits + 1..].trim().to_string(),
                snippet: String::new(),
                url: String::new(),
                source: "Groq Search".to_string(),
            });
        } else if let Some(result) = current.as_mut() {
            if !trimmed.is_empty() {
                result.snippet.push(' ');
                result.snippet.push_str(trimmed);
            }
        }
    }

    if let Some(done) = current {
        results.push(done);
    }
    results
}

#[async_trait]
impl SearchProvider for GroqSearch {
    fn name(&self) -> &'static str {
        "Groq"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let request = CompletionRequest::new(format!(
            "Search for: {}. Provide 3-5 key results with titles, snippets, and sources.",
            query
        ))
        .with_system(GROQ_SEARCH_SYSTEM)
        .with_limits(0.3, 500);

        let content = self.groq.complete(&request).await?;
        Ok(parse_numbered_results(&content))
    }
}

pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self {
            client: search_client(),
        }
    }
}

impl Default for DuckDuckGoSearch {
    fn default() -> Self {
        Self::new()
    }
}

/// Abstract first, then up to five related topics that carry both text and a link.
pub fn parse_instant_answer(data: &serde_json::Value) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if let Some(summary) = data["Abstract"].as_str().filter(|s| !s.is_empty()) {
        results.push(SearchResult {
            title: data["Heading"]
                .as_str()
                .filter(|s| !s.is_empty())
                .unwrap_or("Summary")
                .to_string(),
            snippet: summary.to_string(),
            url: data["AbstractURL"].as_str().unwrap_or_default().to_string(),
            source: data["AbstractSource"]
                .as_str()
                .filter(|s| !s.is_empty())
                .unwrap_or("DuckDuckGo")
                .to_string(),
        });
    }

    if let Some(topics) = data["RelatedTopics"].as_array() {
        for topic in topics.iter().take(5) {
            let (Some(text), Some(url)) = (topic["Text"].as_str(), topic["FirstURL"].as_str()) else {
                continue;
            };
            if text.is_empty() || url.is_empty() {
                continue;
            }
            let title = text.split(" - ").next().filter(|t| !t.is_empty()).unwrap_or("Related");
            results.push(SearchResult {
                title: title.to_string(),
                snippet: text.to_string(),
                url: url.to_string(),
                source: "DuckDuckGo".to_string(),
            });
        }
    }

    results
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &'static str {
        "DuckDuckGo"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let url = format!(
            "{}?q={}&format=json&no_html=1&skip_disambig=1",
            DUCKDUCKGO_URL,
            urlencoding::encode(query)
        );

        let response = self.client.get(&url).send().await?;
        ensure_success(&response)?;
        let data: serde_json::Value = response.json().await?;

        Ok(parse_instant_answer(&data))
    }
}

/// Best-effort search across providers in priority order.
#[derive(Clone)]
pub struct WebSearch {
    providers: Vec<Arc<dyn SearchProvider>>,
}

impl WebSearch {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self { providers }
    }

    /// Google Custom Search, then Groq, then DuckDuckGo.
    pub fn from_config(config: &AppConfig) -> Self {
        let groq = Arc::new(GroqProvider::new(config.groq_api_key.clone()));
        Self::new(vec![
            Arc::new(GoogleSearch::new(
                config.google_search_api_key.clone(),
                config.google_search_engine_id.clone(),
            )),
            Arc::new(GroqSearch::new(groq)),
            Arc::new(DuckDuckGoSearch::new()),
        ])
    }

    /// Returns the first non-empty result set, or `None` when every source came up empty.
    pub async fn search(&self, query: &str) -> Option<Vec<SearchResult>> {
        log::info!("🔍 Searching for: \"{}\"", query);

        for provider in &self.providers {
            match provider.search(query).await {
                Ok(results) if !results.is_empty() => {
                    log::info!("✅ {} search found {} results", provider.name(), results.len());
                    return Some(results);
                }
                Ok(_) => log::debug!("🔍 {} search returned nothing", provider.name()),
                Err(ProviderError::NotConfigured) => {
                    log::debug!("🔍 {} search not configured, skipping", provider.name())
                }
                Err(e) => log::warn!("⚠️ {} search failed: {}", provider.name(), e),
            }
        }

        log::info!("⚠️ No web search results found from any provider");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(&'static str, Result<usize, ()>);

    #[async_trait]
    impl SearchProvider for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, ProviderError> {
            match self.1 {
                Ok(n) => Ok((0..n)
                    .map(|i| SearchResult {
                        title: format!("{} {}", self.0, i),
                        snippet: String::new(),
                        url: String::new(),
                        source: self.0.to_string(),
                    })
                    .collect()),
                Err(()) => Err(ProviderError::Upstream { status: 500 }),
            }
        }
    }

    #[tokio::test]
    async fn test_skips_failed_and_empty_sources() {
        let search = WebSearch::new(vec![
            Arc::new(Fixed("Google", Err(()))),
            Arc::new(Fixed("Groq", Ok(0))),
            Arc::new(Fixed("DuckDuckGo", Ok(2))),
        ]);
        let results = search.search("aadhaar centre").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "DuckDuckGo");
    }

    #[tokio::test]
    async fn test_all_empty_is_none() {
        let search = WebSearch::new(vec![Arc::new(Fixed("Google", Ok(0)))]);
        assert!(search.search("x").await.is_none());
    }

    #[test]
    fn test_parse_numbered_results() {
        let content = "Here are results:\n1. Passport Seva Kendra\nOpen 9am to 5pm\n\n2. mPassport app\nTrack status online\nFree download\n";
        let results = parse_numbered_results(content);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Passport Seva Kendra");
        assert_eq!(results[0].snippet, " Open 9am to 5pm");
        assert_eq!(results[1].snippet, " Track status online Free download");
        assert_eq!(results[1].source, "Groq Search");
    }

    #[test]
    fn test_parse_instant_answer() {
        let data = json!({
            "Heading": "Aadhaar",
            "Abstract": "Aadhaar is a 12-digit unique identity number.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Aadhaar",
            "AbstractSource": "Wikipedia",
            "RelatedTopics": [
                { "Text": "UIDAI - Unique Identification Authority", "FirstURL": "https://duckduckgo.com/UIDAI" },
                { "Name": "Category group without text" }
            ]
        });
        let results = parse_instant_answer(&data);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "Wikipedia");
        assert_eq!(results[1].title, "UIDAI");
    }
}
