use std::env;

pub const DEFAULT_MONGODB_URI: &str = "mongodb://127.0.0.1:27017/civic-ai";
pub const DEFAULT_DATA_GOV_IN_DATASET_ID: &str = "9ef84268-d588-465a-a308-a864a43d0070";

/// Values copied from `.env.example` that must never be sent upstream.
const PLACEHOLDER_KEYS: &[&str] = &[
    "your_gemini_api_key_here",
    "your_groq_api_key_here",
    "your_google_search_api_key_here",
    "your_google_search_engine_id_here",
    "your_alpha_vantage_api_key_here",
    "your_twelve_data_api_key_here",
    "your_data_gov_in_api_key_here",
];

/// Runtime configuration read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    pub mongodb_uri: String,
    pub cors_origins: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub google_search_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
    pub twelve_data_api_key: Option<String>,
    pub data_gov_in_api_key: Option<String>,
    pub data_gov_in_dataset_id: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cors_origins: Vec<String> = [
            "http://localhost:3000",
            "http://localhost:5173",
            "http://127.0.0.1:3000",
            "http://127.0.0.1:5173",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Ok(extra) = env::var("CORS_ORIGINS") {
            cors_origins.extend(
                extra
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            );
        }

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "5000".to_string()),
            mongodb_uri: env::var("MONGODB_URI")
                .or_else(|_| env::var("DATABASE_URL"))
                .unwrap_or_else(|_| DEFAULT_MONGODB_URI.to_string()),
            cors_origins,
            gemini_api_key: api_key("GEMINI_API_KEY"),
            groq_api_key: api_key("GROQ_API_KEY"),
            google_search_api_key: api_key("GOOGLE_SEARCH_API_KEY"),
            google_search_engine_id: api_key("GOOGLE_SEARCH_ENGINE_ID"),
            // Alpha Vantage's public "demo" key only serves IBM; treat it as absent
            alpha_vantage_api_key: api_key("ALPHA_VANTAGE_API_KEY").filter(|k| k != "demo"),
            twelve_data_api_key: api_key("TWELVE_DATA_API_KEY"),
            data_gov_in_api_key: api_key("DATA_GOV_IN_API_KEY"),
            data_gov_in_dataset_id: env::var("DATA_GOV_IN_DATASET_ID")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATA_GOV_IN_DATASET_ID.to_string()),
        }
    }

    /// Logs which upstream integrations are usable, without printing the keys.
    pub fn log_integrations(&self) {
        let status = |k: &Option<String>| if k.is_some() { "✅ configured" } else { "⚪ not configured" };
        log::info!("🔑 Gemini: {}", status(&self.gemini_api_key));
        log::info!("🔑 Groq: {}", status(&self.groq_api_key));
        log::info!(
            "🔑 Google Search: {}",
            if self.google_search_api_key.is_some() && self.google_search_engine_id.is_some() {
                "✅ configured"
            } else {
                "⚪ not configured"
            }
        );
        log::info!("🔑 Twelve Data: {}", status(&self.twelve_data_api_key));
        log::info!("🔑 Alpha Vantage: {}", status(&self.alpha_vantage_api_key));
        log::info!("🔑 Data.gov.in: {}", status(&self.data_gov_in_api_key));
    }
}

/// A key is usable when it is set, non-blank and not a template placeholder.
pub fn is_configured_key(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !PLACEHOLDER_KEYS.contains(&trimmed)
}

fn api_key(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| is_configured_key(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_keys_are_not_configured() {
        assert!(!is_configured_key("your_gemini_api_key_here"));
        assert!(!is_configured_key("your_groq_api_key_here"));
        assert!(!is_configured_key("   "));
        assert!(is_configured_key("AIzaSyRealLookingKey"));
    }
}
