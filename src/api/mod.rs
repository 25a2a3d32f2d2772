pub mod admin;
pub mod ai;
pub mod auth;
pub mod chat;
pub mod discussions;
pub mod feedback;
pub mod health;
pub mod market;
pub mod metrics;
pub mod news;
pub mod realdata;
pub mod resources;
pub mod services;
pub mod stocks;
pub mod swagger;

use actix_web::{guard, web, HttpResponse};
use futures::stream::TryStreamExt;
use mongodb::bson::{oid::ObjectId, Document};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::database::MongoDB;
use crate::middleware::{AdminAuth, AuthMiddleware};
use crate::models::Pagination;
use crate::services::auth_service::{self, Claims};

/// Registers every `/api` route. Shared by `main` and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .service(
                web::resource("/me")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(auth::get_me)),
            ),
    )
    .service(
        web::scope("/api/services")
            .route("", web::get().to(services::list_services))
            .route("/search", web::post().to(services::search_services))
            .route("/category/{category}", web::get().to(services::get_by_category))
            .route("/{id}", web::get().to(services::get_service)),
    )
    .service(
        web::scope("/api/chat")
            .route("/start", web::post().to(chat::start_chat))
            .route("/continue/{session_id}", web::post().to(chat::continue_chat))
            .route("/history/{session_id}", web::get().to(chat::get_history))
            .route("/service/{service_id}", web::get().to(chat::get_chat_service))
            .route("/quick", web::post().to(chat::quick_query)),
    )
    .service(
        web::scope("/api/ai")
            .route("/ai-query", web::post().to(ai::ai_query))
            .route("/translate", web::post().to(ai::translate)),
    )
    .service(web::scope("/api/translate").route("/translate", web::post().to(ai::translate)))
    .service(
        web::scope("/api/market")
            .route("", web::get().to(market::list_market_data))
            .route("/live", web::get().to(market::live_commodities))
            .route("/trending", web::get().to(market::trending))
            .route("/stats", web::get().to(market::stats))
            .route("/state/{state}", web::get().to(market::by_state))
            .route("/compare/{commodity}", web::get().to(market::compare)),
    )
    .service(
        web::scope("/api/stocks")
            .route("", web::get().to(stocks::list_stocks))
            .route("/indices", web::get().to(stocks::get_indices))
            .route("/gainers", web::get().to(stocks::get_gainers))
            .route("/losers", web::get().to(stocks::get_losers))
            .route("/nse/list", web::get().to(stocks::nse_list))
            .route("/nse/search", web::get().to(stocks::nse_search))
            .route("/live/{symbol}", web::get().to(stocks::live_quote))
            .route("/{symbol}", web::get().to(stocks::get_stock)),
    )
    .service(
        web::scope("/api/news")
            .route("", web::get().to(news::list_news))
            .route("/item/{id}", web::get().to(news::get_news_item))
            .service(
                web::resource("/{id}/comment")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(news::add_comment)),
            )
            .service(
                web::resource("/{id}/upvote")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(news::upvote_news)),
            )
            .route("/{category}", web::get().to(news::news_by_category)),
    )
    .service(
        web::scope("/api/discussions")
            .service(
                web::resource("")
                    .guard(guard::Post())
                    .wrap(AuthMiddleware)
                    .route(web::post().to(discussions::create_discussion)),
            )
            .route("", web::get().to(discussions::list_discussions))
            .route("/thread/{id}", web::get().to(discussions::get_thread))
            .service(
                web::resource("/{id}/reply")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(discussions::add_reply)),
            )
            .service(
                web::resource("/{id}/upvote")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(discussions::upvote_discussion)),
            )
            .service(
                web::resource("/{id}/reply/{reply_id}/upvote")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(discussions::upvote_reply)),
            )
            .route("/{category}", web::get().to(discussions::discussions_by_category)),
    )
    .service(
        web::scope("/api/admin")
            .wrap(AdminAuth)
            .wrap(AuthMiddleware)
            .route("/dashboard", web::get().to(admin::dashboard))
            .route("/users", web::get().to(admin::list_users))
            .route("/users/{id}/role", web::put().to(admin::update_user_role))
            .route("/services", web::post().to(admin::create_service))
            .route("/services/{id}", web::put().to(admin::update_service))
            .route("/services/{id}", web::delete().to(admin::delete_service))
            .route("/feedback", web::get().to(admin::list_feedback))
            .route("/feedback/{id}", web::put().to(admin::update_feedback))
            .route("/market-data", web::post().to(admin::create_market_data))
            .route("/market-data/{id}", web::put().to(admin::update_market_data)),
    )
    .service(
        web::scope("/api/realdata")
            .route("/stocks/live", web::get().to(realdata::live_stocks))
            .route("/commodities/live", web::get().to(realdata::live_commodities))
            .route("/services/official", web::get().to(realdata::official_services)),
    )
    .service(web::scope("/api/feedback").route("", web::post().to(feedback::submit_feedback)))
    .service(web::scope("/api/resources").route("/education", web::get().to(resources::education)));
}

pub(crate) fn error_json(mut builder: actix_web::HttpResponseBuilder, message: impl Into<String>) -> HttpResponse {
    builder.json(json!({ "success": false, "error": message.into() }))
}

pub(crate) fn bad_request(message: impl Into<String>) -> HttpResponse {
    error_json(HttpResponse::BadRequest(), message)
}

pub(crate) fn not_found(message: impl Into<String>) -> HttpResponse {
    error_json(HttpResponse::NotFound(), message)
}

pub(crate) fn server_error(context: &str, e: impl std::fmt::Display) -> HttpResponse {
    log::error!("❌ {}: {}", context, e);
    error_json(HttpResponse::InternalServerError(), "Server error")
}

pub(crate) fn parse_object_id(id: &str) -> Result<ObjectId, HttpResponse> {
    ObjectId::parse_str(id).map_err(|_| bad_request("Invalid id"))
}

/// Display name for content authored by the caller. Tokens issued before
/// names were embedded fall back to a user lookup, then to the email.
pub(crate) async fn author_name(db: &MongoDB, claims: &Claims) -> String {
    if let Some(name) = claims.name.as_deref().filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    match auth_service::get_current_user(db, &claims.sub).await {
        Ok(user) => user.name,
        Err(_) => claims.email.clone(),
    }
}

/// One page of `filter` in `sort` order plus the total match count.
pub(crate) async fn find_page<T>(
    collection: &mongodb::Collection<T>,
    filter: Document,
    sort: Document,
    pagination: &Pagination,
) -> Result<(Vec<T>, u64), String>
where
    T: DeserializeOwned + Send + Sync,
{
    let total = collection
        .count_documents(filter.clone())
        .await
        .map_err(|e| format!("Failed to count documents: {}", e))?;

    let items = collection
        .find(filter)
        .sort(sort)
        .skip(pagination.skip())
        .limit(pagination.limit())
        .await
        .map_err(|e| format!("Failed to query documents: {}", e))?
        .try_collect()
        .await
        .map_err(|e| format!("Failed to read documents: {}", e))?;

    Ok((items, total))
}

pub(crate) async fn find_all<T>(
    collection: &mongodb::Collection<T>,
    filter: Document,
    sort: Document,
    limit: Option<i64>,
) -> Result<Vec<T>, String>
where
    T: DeserializeOwned + Send + Sync,
{
    let mut find = collection.find(filter).sort(sort);
    if let Some(limit) = limit {
        find = find.limit(limit);
    }

    find.await
        .map_err(|e| format!("Failed to query documents: {}", e))?
        .try_collect()
        .await
        .map_err(|e| format!("Failed to read documents: {}", e))
}

/// Runs an aggregation pipeline and collects the raw result documents.
pub(crate) async fn aggregate_docs<T>(
    collection: &mongodb::Collection<T>,
    pipeline: Vec<Document>,
) -> Result<Vec<Document>, String>
where
    T: Send + Sync,
{
    collection
        .aggregate(pipeline)
        .await
        .map_err(|e| format!("Failed to run aggregation: {}", e))?
        .try_collect()
        .await
        .map_err(|e| format!("Failed to read aggregation results: {}", e))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::database::MongoDB;

    pub const TEST_MONGODB_URI: &str = "mongodb://127.0.0.1:27017/civic-ai-test";

    pub async fn test_db() -> MongoDB {
        let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| TEST_MONGODB_URI.to_string());
        MongoDB::new(&uri).await.expect("test MongoDB must be reachable")
    }
}
