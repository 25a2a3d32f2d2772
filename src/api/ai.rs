use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::bad_request;
use crate::services::llm::{CompletionRequest, ProviderChain};
use crate::services::prompt::{
    build_ai_query_prompt, search_query_for, AI_UNAVAILABLE_MESSAGE, PORTAL_SYSTEM_MESSAGE,
};
use crate::services::{rate_limit, translation, WebSearch};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiQueryRequest {
    pub message: Option<String>,
    /// Page context sent by the frontend (visible stocks, commodities, location).
    #[schema(value_type = Object)]
    pub context: Option<Value>,
    pub enable_web_search: Option<bool>,
}

#[utoipa::path(
    post,
    path = "/api/ai/ai-query",
    tag = "AI",
    request_body = AiQueryRequest,
    responses(
        (status = 200, description = "Model answer and the provider that produced it"),
        (status = 400, description = "Message is required"),
        (status = 503, description = "Every AI provider failed")
    )
)]
pub async fn ai_query(
    llm: web::Data<ProviderChain>,
    web_search: web::Data<WebSearch>,
    body: web::Json<AiQueryRequest>,
) -> HttpResponse {
    let Some(message) = body.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) else {
        return bad_request("Message is required");
    };
    let context = body.context.as_ref();

    rate_limit::record();

    let results = if body.enable_web_search != Some(false) {
        let results = web_search.search(&search_query_for(message, context)).await;
        match &results {
            Some(r) => log::info!("🔍 Web search returned {} results", r.len()),
            None => log::info!("⚠️ Web search returned no results"),
        }
        results
    } else {
        log::debug!("Web search disabled for this query");
        None
    };

    let prompt = build_ai_query_prompt(message, context, results.as_deref());
    let request = CompletionRequest::new(prompt).with_system(PORTAL_SYSTEM_MESSAGE);

    match llm.complete(&request).await {
        Ok(completion) => HttpResponse::Ok().json(json!({
            "success": true,
            "response": completion.text,
            "provider": completion.provider
        })),
        Err(e) => {
            log::error!("❌ AI query failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "success": false,
                "error": "AI service unavailable",
                "response": AI_UNAVAILABLE_MESSAGE
            }))
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: Option<String>,
    pub target_lang: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/translate/translate",
    tag = "AI",
    request_body = TranslateRequest,
    responses(
        (status = 200, description = "Translated text, or the original with service \"none\"", body = translation::Translation),
        (status = 400, description = "Text and target language required")
    )
)]
pub async fn translate(llm: web::Data<ProviderChain>, body: web::Json<TranslateRequest>) -> HttpResponse {
    let text = body.text.as_deref().filter(|t| !t.trim().is_empty());
    let target = body.target_lang.as_deref().filter(|t| !t.trim().is_empty());

    let (Some(text), Some(target)) = (text, target) else {
        return bad_request("Text and target language required");
    };

    HttpResponse::Ok().json(translation::translate(&llm, text, target).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::{testing, ProviderError};
    use actix_web::{http::StatusCode, test, App};

    async fn call(
        llm: ProviderChain,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(llm))
                .app_data(web::Data::new(WebSearch::new(vec![])))
                .configure(crate::api::configure),
        )
        .await;

        let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
        let res = test::call_service(&app, req).await;
        let status = res.status();
        let body: Value = test::read_body_json(res).await;
        (status, body)
    }

    #[actix_web::test]
    async fn test_ai_query_returns_503_when_every_provider_fails() {
        let llm = testing::chain(
            || Err(ProviderError::RateLimited),
            || Err(ProviderError::Upstream { status: 500 }),
        );
        let (status, body) = call(
            llm,
            "/api/ai/ai-query",
            json!({ "message": "What is the price of onion?", "enableWebSearch": false }),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "AI service unavailable");
        assert_eq!(body["response"], AI_UNAVAILABLE_MESSAGE);
    }

    #[actix_web::test]
    async fn test_ai_query_falls_back_to_groq() {
        let llm = testing::chain(|| Err(ProviderError::RateLimited), || Ok("Onion trades at ₹2,400/quintal.".into()));
        let (status, body) = call(
            llm,
            "/api/ai/ai-query",
            json!({ "message": "What is the price of onion?", "enableWebSearch": false }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Onion trades at ₹2,400/quintal.");
        assert_eq!(body["provider"], "groq");
    }

    #[actix_web::test]
    async fn test_ai_query_requires_message() {
        let llm = testing::chain(|| Ok("unused".into()), || Ok("unused".into()));
        let (status, body) = call(llm, "/api/ai/ai-query", json!({ "message": "  " })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message is required");
    }

    #[actix_web::test]
    async fn test_translate_requires_text_and_target() {
        let llm = testing::chain(|| Ok("unused".into()), || Ok("unused".into()));
        let (status, body) = call(llm, "/api/translate/translate", json!({ "text": "Hello" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Text and target language required");
    }

    #[actix_web::test]
    async fn test_translate_returns_original_text_when_unavailable() {
        let llm = testing::chain(
            || Err(ProviderError::NotConfigured),
            || Err(ProviderError::NotConfigured),
        );
        let (status, body) = call(
            llm,
            "/api/ai/translate",
            json!({ "text": "Hello", "targetLang": "hi" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translatedText"], "Hello");
        assert_eq!(body["service"], "none");
    }
}
