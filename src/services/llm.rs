use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::api::metrics;
use crate::config::AppConfig;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_MODEL: &str = "gemini-2.0-flash-lite";
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";
const LLM_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API key not configured")]
    NotConfigured,
    #[error("rate limited (429)")]
    RateLimited,
    #[error("upstream returned status {status}")]
    Upstream { status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("empty response")]
    EmptyResponse,
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Missing keys are a deployment problem, everything else is transient.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProviderError::NotConfigured)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 800,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_limits(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

/// A hosted text-generation API.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn non_empty(text: Option<&str>) -> Result<String, ProviderError> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .ok_or(ProviderError::EmptyResponse)
}

async fn check_status(response: reqwest::Response, provider: &str) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status.as_u16() == 429 {
        log::error!("🚫 {} rate limit (429): {}", provider, body);
        return Err(ProviderError::RateLimited);
    }

    log::error!("❌ {} API error {}: {}", provider, status, body);
    Err(ProviderError::Upstream { status: status.as_u16() })
}

pub struct GeminiProvider {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: http_client(LLM_TIMEOUT_SECS),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE,
            GEMINI_MODEL,
            urlencoding::encode(api_key)
        );

        let mut body = json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            }
        });
        if let Some(system) = &request.system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        log::debug!("🤖 Querying Gemini ({})", GEMINI_MODEL);

        let response = self.client.post(&url).json(&body).send().await?;
        let data: serde_json::Value = check_status(response, "Gemini").await?.json().await?;

        non_empty(data["candidates"][0]["content"]["parts"][0]["text"].as_str())
    }
}

pub struct GroqProvider {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: http_client(LLM_TIMEOUT_SECS),
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        let body = json!({
            "model": GROQ_MODEL,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        log::debug!("🤖 Querying Groq ({})", GROQ_MODEL);

        let response = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let data: serde_json::Value = check_status(response, "Groq").await?.json().await?;

        non_empty(data["choices"][0]["message"]["content"].as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub provider: &'static str,
}

#[derive(Debug, Error)]
#[error("all AI providers failed: {}", describe(.attempts))]
pub struct ChainExhausted {
    pub attempts: Vec<(&'static str, ProviderError)>,
}

fn describe(attempts: &[(&'static str, ProviderError)]) -> String {
    attempts
        .iter()
        .map(|(name, e)| format!("{}: {}", name, e))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Ordered provider fallback. The first provider that returns text wins.
#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Gemini first, then Groq.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(vec![
            Arc::new(GeminiProvider::new(config.gemini_api_key.clone())),
            Arc::new(GroqProvider::new(config.groq_api_key.clone())),
        ])
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ChainExhausted> {
        metrics::increment_ai_request_count();
        let mut attempts = Vec::new();

        for provider in &self.providers {
            match provider.complete(request).await {
                Ok(text) => {
                    if !attempts.is_empty() {
                        log::info!("✅ {} fallback successful", provider.name());
                    }
                    return Ok(Completion {
                        text,
                        provider: provider.name(),
                    });
                }
                Err(e) => {
                    if e.is_configuration() {
                        log::warn!("⚠️ {} skipped: {}", provider.name(), e);
                    } else {
                        metrics::increment_ai_failure_count();
                        log::error!("❌ {} failed: {}", provider.name(), e);
                    }
                    attempts.push((provider.name(), e));
                }
            }
        }

        Err(ChainExhausted { attempts })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Provider that answers from a fixed script.
    pub struct StaticProvider {
        pub name: &'static str,
        pub reply: fn() -> Result<String, ProviderError>,
    }

    #[async_trait]
    impl LlmProvider for StaticProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
            (self.reply)()
        }
    }

    pub fn chain(gemini: fn() -> Result<String, ProviderError>, groq: fn() -> Result<String, ProviderError>) -> ProviderChain {
        ProviderChain::new(vec![
            Arc::new(StaticProvider { name: "gemini", reply: gemini }),
            Arc::new(StaticProvider { name: "groq", reply: groq }),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::testing::chain;
    use super::*;

    #[tokio::test]
    async fn test_first_provider_wins() {
        let chain = chain(|| Ok("from gemini".into()), || Ok("from groq".into()));
        let completion = chain.complete(&CompletionRequest::new("hi")).await.unwrap();
        assert_eq!(completion.provider, "gemini");
        assert_eq!(completion.text, "from gemini");
    }

    #[tokio::test]
    async fn test_rate_limited_gemini_falls_back_to_groq() {
        let chain = chain(|| Err(ProviderError::RateLimited), || Ok("from groq".into()));
        let completion = chain.complete(&CompletionRequest::new("hi")).await.unwrap();
        assert_eq!(completion.provider, "groq");
        assert_eq!(completion.text, "from groq");
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_every_attempt() {
        let chain = chain(|| Err(ProviderError::NotConfigured), || Err(ProviderError::Upstream { status: 500 }));
        let err = chain.complete(&CompletionRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.attempts.len(), 2);
        assert!(err.attempts[0].1.is_configuration());
        assert!(!err.attempts[1].1.is_configuration());
        assert!(err.to_string().contains("groq: upstream returned status 500"));
    }

    #[tokio::test]
    async fn test_unconfigured_providers_fail_without_network() {
        let request = CompletionRequest::new("hi");
        assert!(matches!(
            GeminiProvider::new(None).complete(&request).await,
            Err(ProviderError::NotConfigured)
        ));
        assert!(matches!(
            GroqProvider::new(None).complete(&request).await,
            Err(ProviderError::NotConfigured)
        ));
    }

    #[test]
    fn test_blank_text_is_empty_response() {
        assert!(matches!(non_empty(Some("  ")), Err(ProviderError::EmptyResponse)));
        assert_eq!(non_empty(Some(" ok ")).unwrap(), "ok");
    }
}
