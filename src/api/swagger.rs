use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Civic Portal Service API",
        version = "1.0.0",
        description = "Backend for the Digital India civic portal.\n\n**Authentication:** board writes and every `/api/admin` route require a JWT Bearer token; admin routes also require an admin role.\n\n**Features:**\n- Government service directory with search\n- Multilingual chat assistant (Gemini with Groq fallback)\n- Mandi commodity prices and NSE stock quotes\n- News and discussion boards\n- Citizen feedback and admin triage",
        contact(
            name = "Civic Portal Team",
            email = "support@digitalindia.gov.in"
        )
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::get_me,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Services
        crate::api::services::list_services,
        crate::api::services::get_service,
        crate::api::services::search_services,

        // Chat & AI
        crate::api::chat::start_chat,
        crate::api::chat::continue_chat,
        crate::api::ai::ai_query,
        crate::api::ai::translate,

        // Market & Stocks
        crate::api::market::list_market_data,
        crate::api::market::live_commodities,
        crate::api::stocks::list_stocks,
        crate::api::stocks::live_quote,
        crate::api::realdata::live_stocks,

        // Boards
        crate::api::news::list_news,
        crate::api::news::add_comment,
        crate::api::discussions::list_discussions,
        crate::api::discussions::create_discussion,

        // Feedback & Resources
        crate::api::feedback::submit_feedback,
        crate::api::resources::education,

        // Admin
        crate::api::admin::dashboard,
        crate::api::admin::create_service,
        crate::api::admin::create_market_data,
    ),
    components(
        schemas(
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
            crate::models::Service,
            crate::models::ServiceInput,
            crate::models::MarketData,
            crate::models::MarketDataInput,
            crate::models::News,
            crate::models::Discussion,
            crate::models::CreateDiscussionRequest,
            crate::models::ContentRequest,
            crate::models::ServiceFeedback,
            crate::models::CreateFeedbackRequest,
            crate::api::chat::ChatRequest,
            crate::api::ai::AiQueryRequest,
            crate::api::ai::TranslateRequest,
            crate::api::services::SearchRequest,
            crate::services::translation::Translation,
            crate::services::stock_data_service::StockQuote,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and the current user."),
        (name = "Health", description = "Liveness and Prometheus metrics."),
        (name = "Services", description = "Government service directory: filtering, grouped search and lookup."),
        (name = "Chat", description = "Session-based multilingual assistant grounded in the service directory."),
        (name = "AI", description = "Stateless AI query with optional web search, and translation."),
        (name = "Market", description = "Mandi prices stored in the portal and the live AGMARKNET mirror."),
        (name = "Stocks", description = "Featured NSE stocks, indices and live quotes."),
        (name = "Real Data", description = "Live market board with trading-hours status."),
        (name = "News", description = "News board with comments and upvotes."),
        (name = "Discussions", description = "Community threads with replies and upvotes."),
        (name = "Feedback", description = "Citizen feedback on service listings."),
        (name = "Resources", description = "Educational guides."),
        (name = "Admin", description = "Dashboard, user roles, service catalog, feedback triage and market data. Admin role required."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/chat/start"));
        assert!(doc.paths.paths.contains_key("/api/admin/dashboard"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
