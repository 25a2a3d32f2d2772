use serde::Serialize;

use crate::services::llm::{CompletionRequest, ProviderChain};

const TRANSLATOR_SYSTEM_MESSAGE: &str =
    "You are a professional translator. Provide only the translation without any explanations.";

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("hi", "Hindi"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("bn", "Bengali"),
    ("gu", "Gujarati"),
    ("kn", "Kannada"),
    ("mr", "Marathi"),
    ("en", "English"),
];

/// Display name for a language code. Unknown codes pass through unchanged.
pub fn language_name(code: &str) -> &str {
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

pub fn translation_prompt(text: &str, target_lang: &str) -> String {
    format!(
        "Translate the following text to {}. Only provide the translation, no explanations:\n\n\"{}\"\n\nTranslation:",
        language_name(target_lang),
        text
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
    pub service: String,
}

/// Translates through the provider chain. When every provider fails the
/// original text comes back with service `"none"`.
pub async fn translate(llm: &ProviderChain, text: &str, target_lang: &str) -> Translation {
    let request = CompletionRequest::new(translation_prompt(text, target_lang))
        .with_system(TRANSLATOR_SYSTEM_MESSAGE)
        .with_limits(0.3, 200);

    match llm.complete(&request).await {
        Ok(completion) => {
            log::info!("✅ Translated to {} via {}", target_lang, completion.provider);
            Translation {
                translated_text: completion.text.trim().to_string(),
                service: completion.provider.to_string(),
            }
        }
        Err(e) => {
            log::warn!("⚠️ Translation unavailable, returning original text: {}", e);
            Translation {
                translated_text: text.to_string(),
                service: "none".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::testing::chain;
    use crate::services::llm::ProviderError;

    #[test]
    fn test_language_name_passthrough() {
        assert_eq!(language_name("ta"), "Tamil");
        assert_eq!(language_name("fr"), "fr");
    }

    #[test]
    fn test_prompt_names_target_language() {
        let prompt = translation_prompt("Hello", "hi");
        assert!(prompt.starts_with("Translate the following text to Hindi."));
        assert!(prompt.contains("\"Hello\""));
        assert!(prompt.ends_with("Translation:"));
    }

    #[tokio::test]
    async fn test_translate_uses_fallback_provider() {
        let llm = chain(|| Err(ProviderError::RateLimited), || Ok("  नमस्ते \n".into()));
        let result = translate(&llm, "Hello", "hi").await;
        assert_eq!(result.translated_text, "नमस्ते");
        assert_eq!(result.service, "groq");
    }

    #[tokio::test]
    async fn test_translate_returns_original_when_unavailable() {
        let llm = chain(|| Err(ProviderError::NotConfigured), || Err(ProviderError::NotConfigured));
        let result = translate(&llm, "Hello", "hi").await;
        assert_eq!(result.translated_text, "Hello");
        assert_eq!(result.service, "none");
    }
}
