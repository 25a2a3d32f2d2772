use actix_web::{web, HttpResponse};
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use serde::Deserialize;
use serde_json::json;

use crate::api::{author_name, bad_request, find_all, find_page, not_found, parse_object_id, server_error};
use crate::database::MongoDB;
use crate::models::{now_millis, ContentRequest, News, Pagination};
use crate::services::auth_service::Claims;
use crate::utils::escape_regex;

const CATEGORY_LIMIT: i64 = 10;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct NewsFilters {
    pub category: Option<String>,
    /// Case-insensitive match on title or excerpt.
    pub search: Option<String>,
}

pub fn build_news_filter(filters: &NewsFilters) -> Document {
    let mut filter = doc! { "isActive": true };

    if let Some(category) = filters.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        filter.insert("category", category);
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = escape_regex(search);
        filter.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": &pattern, "$options": "i" } },
                doc! { "excerpt": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    filter
}

fn board_sort() -> Document {
    doc! { "isFeatured": -1, "createdAt": -1 }
}

fn collection(db: &MongoDB) -> mongodb::Collection<News> {
    db.collection::<News>(News::COLLECTION)
}

#[utoipa::path(
    get,
    path = "/api/news",
    tag = "News",
    params(NewsFilters, ("page" = Option<u64>, Query,), ("limit" = Option<i64>, Query,)),
    responses((status = 200, description = "Featured first, then newest"))
)]
pub async fn list_news(
    db: web::Data<MongoDB>,
    filters: web::Query<NewsFilters>,
    pagination: web::Query<Pagination>,
) -> HttpResponse {
    match find_page(&collection(&db), build_news_filter(&filters), board_sort(), &pagination).await {
        Ok((news, total)) => HttpResponse::Ok().json(json!({
            "news": news,
            "totalPages": pagination.total_pages(total),
            "currentPage": pagination.page(),
            "total": total
        })),
        Err(e) => server_error("Error fetching news", e),
    }
}

pub async fn news_by_category(db: web::Data<MongoDB>, category: web::Path<String>) -> HttpResponse {
    let filter = doc! { "category": category.as_str(), "isActive": true };

    match find_all(&collection(&db), filter, board_sort(), Some(CATEGORY_LIMIT)).await {
        Ok(news) => HttpResponse::Ok().json(news),
        Err(e) => server_error("Error fetching news", e),
    }
}

pub async fn get_news_item(db: web::Data<MongoDB>, id: web::Path<String>) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };

    match collection(&db).find_one(doc! { "_id": oid }).await {
        Ok(Some(news)) => HttpResponse::Ok().json(news),
        Ok(None) => not_found("News not found"),
        Err(e) => server_error("Error fetching news item", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/news/{id}/comment",
    tag = "News",
    request_body = ContentRequest,
    responses(
        (status = 200, description = "News item with the new comment", body = News),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "News not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_comment(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    id: web::Path<String>,
    body: web::Json<ContentRequest>,
) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };
    let Some(content) = body.content.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
        return bad_request("Comment content is required");
    };

    let author = author_name(&db, &claims).await;
    let now = now_millis();
    let comment = doc! {
        "_id": ObjectId::new(),
        "author": author,
        "content": content,
        "createdAt": now,
        "upvotes": 0_i64,
    };

    let updated = collection(&db)
        .find_one_and_update(
            doc! { "_id": oid },
            doc! { "$push": { "comments": comment }, "$set": { "updatedAt": now } },
        )
        .return_document(ReturnDocument::After)
        .await;

    match updated {
        Ok(Some(news)) => HttpResponse::Ok().json(news),
        Ok(None) => not_found("News not found"),
        Err(e) => server_error("Error adding comment", e),
    }
}

pub async fn upvote_news(db: web::Data<MongoDB>, id: web::Path<String>) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };

    let updated = collection(&db)
        .find_one_and_update(doc! { "_id": oid }, doc! { "$inc": { "upvotes": 1 } })
        .return_document(ReturnDocument::After)
        .await;

    match updated {
        Ok(Some(news)) => HttpResponse::Ok().json(json!({ "upvotes": news.upvotes })),
        Ok(None) => not_found("News not found"),
        Err(e) => server_error("Error upvoting news", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[::core::prelude::v1::test]
    fn test_search_matches_title_or_excerpt() {
        let filter = build_news_filter(&NewsFilters {
            category: Some("market".into()),
            search: Some("GST (2.0)".into()),
        });
        assert_eq!(filter.get_str("category").unwrap(), "market");
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 2);
        let title = or[0].as_document().unwrap().get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"GST \(2\.0\)");
    }

    #[actix_web::test]
    async fn test_comment_requires_token() {
        let app = test::init_service(App::new().configure(crate::api::configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/news/65a1b2c3d4e5f6a7b8c9d0e1/comment")
            .set_json(json!({ "content": "Useful update" }))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }
}
