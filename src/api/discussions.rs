use actix_web::{web, HttpResponse};
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use serde::Deserialize;
use serde_json::json;

use crate::api::{author_name, bad_request, error_json, find_page, not_found, parse_object_id, server_error};
use crate::database::MongoDB;
use crate::models::{now_millis, BoardCategory, ContentRequest, CreateDiscussionRequest, Discussion, Pagination};
use crate::services::auth_service::Claims;
use crate::utils::escape_regex;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct DiscussionFilters {
    pub category: Option<String>,
    /// Case-insensitive match on title or content.
    pub search: Option<String>,
}

pub fn build_discussion_filter(filters: &DiscussionFilters) -> Document {
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
                doc! { "content": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    filter
}

/// Pinned threads first, then most recently active.
fn thread_sort() -> Document {
    doc! { "isPinned": -1, "lastActivity": -1 }
}

fn collection(db: &MongoDB) -> mongodb::Collection<Discussion> {
    db.collection::<Discussion>(Discussion::COLLECTION)
}

async fn page_response(db: &MongoDB, filter: Document, pagination: &Pagination) -> HttpResponse {
    match find_page(&collection(db), filter, thread_sort(), pagination).await {
        Ok((discussions, total)) => HttpResponse::Ok().json(json!({
            "discussions": discussions,
            "totalPages": pagination.total_pages(total),
            "currentPage": pagination.page(),
            "total": total
        })),
        Err(e) => server_error("Error fetching discussions", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/discussions",
    tag = "Discussions",
    params(DiscussionFilters, ("page" = Option<u64>, Query,), ("limit" = Option<i64>, Query,)),
    responses((status = 200, description = "Paginated threads"))
)]
pub async fn list_discussions(
    db: web::Data<MongoDB>,
    filters: web::Query<DiscussionFilters>,
    pagination: web::Query<Pagination>,
) -> HttpResponse {
    page_response(&db, build_discussion_filter(&filters), &pagination).await
}

pub async fn discussions_by_category(
    db: web::Data<MongoDB>,
    category: web::Path<String>,
    pagination: web::Query<Pagination>,
) -> HttpResponse {
    page_response(&db, doc! { "category": category.as_str(), "isActive": true }, &pagination).await
}

pub async fn get_thread(db: web::Data<MongoDB>, id: web::Path<String>) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };

    let viewed = collection(&db)
        .find_one_and_update(doc! { "_id": oid }, doc! { "$inc": { "views": 1 } })
        .return_document(ReturnDocument::After)
        .await;

    match viewed {
        Ok(Some(discussion)) => HttpResponse::Ok().json(discussion),
        Ok(None) => not_found("Discussion not found"),
        Err(e) => server_error("Error fetching discussion", e),
    }
}

/// Validated thread from a create request.
pub fn new_discussion(request: &CreateDiscussionRequest, author_id: &str, author: String) -> Result<Discussion, String> {
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("Title is required")?;
    let content = request
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or("Content is required")?;
    let category = request.category.as_deref().unwrap_or("general");
    let category = BoardCategory::parse(category).ok_or_else(|| format!("Invalid category: {}", category))?;

    let now = now_millis();
    Ok(Discussion {
        id: None,
        title: title.to_string(),
        content: content.to_string(),
        author: author_id.to_string(),
        author_name: author,
        category,
        tags: request
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect(),
        upvotes: 0,
        downvotes: 0,
        replies: Vec::new(),
        is_active: true,
        is_pinned: false,
        is_locked: false,
        views: 0,
        last_activity: now,
        created_at: now,
        updated_at: now,
    })
}

#[utoipa::path(
    post,
    path = "/api/discussions",
    tag = "Discussions",
    request_body = CreateDiscussionRequest,
    responses(
        (status = 201, description = "Thread created", body = Discussion),
        (status = 400, description = "Missing title, content or invalid category"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_discussion(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    body: web::Json<CreateDiscussionRequest>,
) -> HttpResponse {
    let author = author_name(&db, &claims).await;
    let mut discussion = match new_discussion(&body, &claims.sub, author) {
        Ok(discussion) => discussion,
        Err(e) => return bad_request(e),
    };

    match collection(&db).insert_one(&discussion).await {
        Ok(result) => {
            discussion.id = result.inserted_id.as_object_id();
            log::info!("💬 Discussion created by {}: {}", claims.sub, discussion.title);
            HttpResponse::Created().json(discussion)
        }
        Err(e) => server_error("Error creating discussion", e),
    }
}

pub async fn add_reply(
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
        return bad_request("Reply content is required");
    };

    let collection = collection(&db);
    match collection.find_one(doc! { "_id": oid }).await {
        Ok(Some(discussion)) if discussion.is_locked => {
            return error_json(HttpResponse::Forbidden(), "Discussion is locked");
        }
        Ok(Some(_)) => {}
        Ok(None) => return not_found("Discussion not found"),
        Err(e) => return server_error("Error adding reply", e),
    }

    let now = now_millis();
    let reply = doc! {
        "_id": ObjectId::new(),
        "author": claims.sub.as_str(),
        "authorName": author_name(&db, &claims).await,
        "content": content,
        "createdAt": now,
        "upvotes": 0_i64,
        "downvotes": 0_i64,
    };
    let update = doc! {
        "$push": { "replies": reply },
        "$set": { "lastActivity": now, "updatedAt": now },
    };

    match collection
        .find_one_and_update(doc! { "_id": oid }, update)
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(discussion)) => HttpResponse::Ok().json(discussion),
        Ok(None) => not_found("Discussion not found"),
        Err(e) => server_error("Error adding reply", e),
    }
}

pub async fn upvote_discussion(db: web::Data<MongoDB>, id: web::Path<String>) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };

    let update = doc! { "$inc": { "upvotes": 1 }, "$set": { "lastActivity": now_millis() } };
    match collection(&db)
        .find_one_and_update(doc! { "_id": oid }, update)
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(discussion)) => HttpResponse::Ok().json(json!({ "upvotes": discussion.upvotes })),
        Ok(None) => not_found("Discussion not found"),
        Err(e) => server_error("Error upvoting discussion", e),
    }
}

pub async fn upvote_reply(db: web::Data<MongoDB>, path: web::Path<(String, String)>) -> HttpResponse {
    let (id, reply_id) = path.into_inner();
    let (oid, reply_oid) = match (parse_object_id(&id), parse_object_id(&reply_id)) {
        (Ok(oid), Ok(reply_oid)) => (oid, reply_oid),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    let collection = collection(&db);

    let updated = collection
        .find_one_and_update(
            doc! { "_id": oid, "replies._id": reply_oid },
            doc! { "$inc": { "replies.$.upvotes": 1 } },
        )
        .return_document(ReturnDocument::After)
        .await;

    match updated {
        Ok(Some(discussion)) => {
            let upvotes = discussion
                .replies
                .iter()
                .find(|r| r.id == Some(reply_oid))
                .map(|r| r.upvotes)
                .unwrap_or_default();
            HttpResponse::Ok().json(json!({ "upvotes": upvotes }))
        }
        Ok(None) => match collection.count_documents(doc! { "_id": oid }).await {
            Ok(0) => not_found("Discussion not found"),
            Ok(_) => not_found("Reply not found"),
            Err(e) => server_error("Error upvoting reply", e),
        },
        Err(e) => server_error("Error upvoting reply", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_db;
    use crate::models::User;
    use crate::services::auth_service::generate_jwt;
    use actix_web::{http::StatusCode, test, App};

    fn request(title: Option<&str>, category: Option<&str>) -> CreateDiscussionRequest {
        CreateDiscussionRequest {
            title: title.map(String::from),
            content: Some("How long does PAN correction take?".into()),
            category: category.map(String::from),
            tags: vec![" PAN ".into(), "".into()],
        }
    }

    #[::core::prelude::v1::test]
    fn test_new_discussion_validates_and_normalizes() {
        let d = new_discussion(&request(Some("PAN delays"), None), "abc", "Ravi".into()).unwrap();
        assert_eq!(d.category, BoardCategory::General);
        assert_eq!(d.tags, vec!["pan"]);
        assert_eq!(d.last_activity, d.created_at);

        assert_eq!(new_discussion(&request(None, None), "abc", "Ravi".into()).unwrap_err(), "Title is required");
        assert!(new_discussion(&request(Some("x"), Some("sports")), "abc", "Ravi".into()).is_err());
    }

    #[::core::prelude::v1::test]
    fn test_sort_puts_pinned_first() {
        let sort = thread_sort();
        let keys: Vec<_> = sort.keys().collect();
        assert_eq!(keys, vec!["isPinned", "lastActivity"]);
    }

    #[actix_web::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_reply_to_locked_thread_is_forbidden() {
        let db = test_db().await;
        let user = User {
            id: Some(ObjectId::new()),
            name: "Meera".into(),
            email: "meera@example.in".into(),
            ..User::default()
        };
        let token = generate_jwt(&user).unwrap();

        let mut thread = new_discussion(&request(Some("Locked thread"), Some("service")), "abc", "Ravi".into()).unwrap();
        thread.is_locked = true;
        let id = collection(&db).insert_one(&thread).await.unwrap().inserted_id.as_object_id().unwrap();

        let app = test::init_service(
            App::new().app_data(web::Data::new(db.clone())).configure(crate::api::configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri(&format!("/api/discussions/{}/reply", id.to_hex()))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(json!({ "content": "Any update?" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        collection(&db).delete_one(doc! { "_id": id }).await.unwrap();
    }
}
