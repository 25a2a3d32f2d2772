use actix_web::{web, HttpResponse};
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use serde::Deserialize;
use serde_json::json;

use crate::api::{
    aggregate_docs, bad_request, find_all, find_page, not_found, parse_object_id, server_error,
};
use crate::database::MongoDB;
use crate::models::{
    bson_value, now_millis, ChatSession, FeedbackResponse, FeedbackStatus, MarketData, MarketDataInput,
    Pagination, Permissions, Service, ServiceFeedback, ServiceInput, UpdateFeedbackRequest, User, UserRole,
};
use crate::services::auth_service::Claims;
use crate::utils::escape_regex;

fn users(db: &MongoDB) -> mongodb::Collection<User> {
    db.collection::<User>(User::COLLECTION)
}

fn to_json(docs: Vec<Document>) -> Vec<serde_json::Value> {
    docs.into_iter()
        .map(|d| serde_json::to_value(&d).unwrap_or(serde_json::Value::Null))
        .collect()
}

fn count_by(field: &str) -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": format!("${}", field), "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
    ]
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "Admin",
    responses(
        (status = 200, description = "Collection totals, role and category breakdowns, newest users"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin privileges required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn dashboard(db: web::Data<MongoDB>) -> HttpResponse {
    let users = users(&db);
    let services = db.collection::<Service>(Service::COLLECTION);
    let feedback = db.collection::<ServiceFeedback>(ServiceFeedback::COLLECTION);

    let counts = futures::try_join!(
        async { users.count_documents(doc! {}).await },
        async { services.count_documents(doc! {}).await },
        async { db.collection::<ChatSession>(ChatSession::COLLECTION).count_documents(doc! {}).await },
        async { feedback.count_documents(doc! {}).await },
        async { feedback.count_documents(doc! { "status": FeedbackStatus::Open.as_str() }).await },
        async { db.collection::<MarketData>(MarketData::COLLECTION).count_documents(doc! {}).await },
    );
    let (total_users, total_services, total_sessions, total_feedback, pending_feedback, total_market) =
        match counts {
            Ok(counts) => counts,
            Err(e) => return server_error("Error fetching dashboard data", e),
        };

    let breakdowns = futures::try_join!(
        aggregate_docs(&users, count_by("role")),
        aggregate_docs(&services, count_by("category")),
        find_all(&users, doc! {}, doc! { "createdAt": -1 }, Some(10)),
    );
    let (user_stats, service_stats, recent) = match breakdowns {
        Ok(b) => b,
        Err(e) => return server_error("Error fetching dashboard data", e),
    };
    let recent_users: Vec<User> = recent.into_iter().map(User::without_password).collect();

    HttpResponse::Ok().json(json!({
        "stats": {
            "totalUsers": total_users,
            "totalServices": total_services,
            "totalChatSessions": total_sessions,
            "totalFeedback": total_feedback,
            "pendingFeedback": pending_feedback,
            "totalMarketData": total_market
        },
        "userStats": to_json(user_stats),
        "serviceStats": to_json(service_stats),
        "recentUsers": recent_users
    }))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct UserFilters {
    pub role: Option<String>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
}

pub fn build_user_filter(filters: &UserFilters) -> Document {
    let mut filter = doc! {};
    if let Some(role) = filters.role.as_deref().filter(|r| !r.is_empty()) {
        filter.insert("role", role);
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = escape_regex(search);
        filter.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": &pattern, "$options": "i" } },
                doc! { "email": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }
    filter
}

pub async fn list_users(
    db: web::Data<MongoDB>,
    filters: web::Query<UserFilters>,
    pagination: web::Query<Pagination>,
) -> HttpResponse {
    match find_page(&users(&db), build_user_filter(&filters), doc! { "createdAt": -1 }, &pagination).await {
        Ok((users, total)) => {
            let users: Vec<User> = users.into_iter().map(User::without_password).collect();
            HttpResponse::Ok().json(json!({
                "users": users,
                "totalPages": pagination.total_pages(total),
                "currentPage": pagination.page(),
                "total": total
            }))
        }
        Err(e) => server_error("Error fetching users", e),
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Option<String>,
    pub permissions: Option<Permissions>,
}

pub fn role_update(request: &UpdateRoleRequest) -> Result<Document, String> {
    let role = request.role.as_deref().ok_or("role is required")?;
    let role = UserRole::parse(role).ok_or_else(|| format!("Invalid role: {}", role))?;

    let mut set = doc! { "role": role.as_str(), "updatedAt": now_millis() };
    if let Some(permissions) = &request.permissions {
        set.insert("permissions", bson_value(permissions, "permissions")?);
    }
    Ok(doc! { "$set": set })
}

pub async fn update_user_role(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    id: web::Path<String>,
    body: web::Json<UpdateRoleRequest>,
) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };
    let update = match role_update(&body) {
        Ok(update) => update,
        Err(e) => return bad_request(e),
    };

    match users(&db)
        .find_one_and_update(doc! { "_id": oid }, update)
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(user)) => {
            log::info!("👤 {} changed role of {} to {}", claims.sub, user.email, user.role.as_str());
            HttpResponse::Ok().json(user.without_password())
        }
        Ok(None) => not_found("User not found"),
        Err(e) => server_error("Error updating user role", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/services",
    tag = "Admin",
    request_body = ServiceInput,
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 400, description = "Missing required field")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_service(db: web::Data<MongoDB>, body: web::Json<ServiceInput>) -> HttpResponse {
    let mut service = match body.into_inner().into_service() {
        Ok(service) => service,
        Err(e) => return bad_request(e),
    };

    match db.collection::<Service>(Service::COLLECTION).insert_one(&service).await {
        Ok(result) => {
            service.id = result.inserted_id.as_object_id();
            log::info!("🏛️ Service created: {}", service.name);
            HttpResponse::Created().json(service)
        }
        Err(e) => server_error("Error creating service", e),
    }
}

pub async fn update_service(
    db: web::Data<MongoDB>,
    id: web::Path<String>,
    body: web::Json<ServiceInput>,
) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };
    let set = match body.to_set_document() {
        Ok(set) => set,
        Err(e) => return bad_request(e),
    };

    match db
        .collection::<Service>(Service::COLLECTION)
        .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(service)) => HttpResponse::Ok().json(service),
        Ok(None) => not_found("Service not found"),
        Err(e) => server_error("Error updating service", e),
    }
}

pub async fn delete_service(db: web::Data<MongoDB>, id: web::Path<String>) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };

    match db.collection::<Service>(Service::COLLECTION).delete_one(doc! { "_id": oid }).await {
        Ok(result) if result.deleted_count == 0 => not_found("Service not found"),
        Ok(_) => HttpResponse::Ok().json(json!({ "success": true, "message": "Service deleted successfully" })),
        Err(e) => server_error("Error deleting service", e),
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct FeedbackFilters {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub feedback_type: Option<String>,
    pub priority: Option<String>,
}

pub fn build_feedback_filter(filters: &FeedbackFilters) -> Document {
    let mut filter = doc! {};
    for (field, value) in [
        ("status", &filters.status),
        ("type", &filters.feedback_type),
        ("priority", &filters.priority),
    ] {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            filter.insert(field, v);
        }
    }
    filter
}

pub async fn list_feedback(
    db: web::Data<MongoDB>,
    filters: web::Query<FeedbackFilters>,
    pagination: web::Query<Pagination>,
) -> HttpResponse {
    let collection = db.collection::<ServiceFeedback>(ServiceFeedback::COLLECTION);

    match find_page(&collection, build_feedback_filter(&filters), doc! { "createdAt": -1 }, &pagination).await {
        Ok((feedback, total)) => HttpResponse::Ok().json(json!({
            "feedback": feedback,
            "totalPages": pagination.total_pages(total),
            "currentPage": pagination.page(),
            "total": total
        })),
        Err(e) => server_error("Error fetching feedback", e),
    }
}

/// Update for an admin triage action. Resolving stamps who and when; a
/// response is appended as an official reply.
pub fn feedback_update(request: &UpdateFeedbackRequest, admin_id: &str, now: i64) -> Result<Document, String> {
    let response = request.response.as_deref().map(str::trim).filter(|r| !r.is_empty());
    if request.status.is_none() && response.is_none() {
        return Err("status or response is required".to_string());
    }

    let mut set = doc! { "updatedAt": now };
    if let Some(status) = request.status {
        set.insert("status", status.as_str());
        if status == FeedbackStatus::Resolved {
            set.insert("resolvedAt", now);
            set.insert("resolvedBy", admin_id);
        }
    }

    let mut update = doc! { "$set": set };
    if let Some(message) = response {
        let entry = FeedbackResponse {
            user_id: Some(admin_id.to_string()),
            message: message.to_string(),
            is_official: true,
            attachments: Vec::new(),
            timestamp: now,
        };
        update.insert("$push", doc! { "responses": bson_value(&entry, "response")? });
    }
    Ok(update)
}

pub async fn update_feedback(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    id: web::Path<String>,
    body: web::Json<UpdateFeedbackRequest>,
) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };
    let update = match feedback_update(&body, &claims.sub, now_millis()) {
        Ok(update) => update,
        Err(e) => return bad_request(e),
    };

    match db
        .collection::<ServiceFeedback>(ServiceFeedback::COLLECTION)
        .find_one_and_update(doc! { "_id": oid }, update)
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(feedback)) => HttpResponse::Ok().json(feedback),
        Ok(None) => not_found("Feedback not found"),
        Err(e) => server_error("Error updating feedback", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/market-data",
    tag = "Admin",
    request_body = MarketDataInput,
    responses(
        (status = 201, description = "Market record created", body = MarketData),
        (status = 400, description = "Missing field or invalid unit")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_market_data(db: web::Data<MongoDB>, body: web::Json<MarketDataInput>) -> HttpResponse {
    let mut record = match body.into_inner().into_market_data() {
        Ok(record) => record,
        Err(e) => return bad_request(e),
    };

    match db.collection::<MarketData>(MarketData::COLLECTION).insert_one(&record).await {
        Ok(result) => {
            record.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(record)
        }
        Err(e) => server_error("Error creating market data", e),
    }
}

pub async fn update_market_data(
    db: web::Data<MongoDB>,
    id: web::Path<String>,
    body: web::Json<MarketDataInput>,
) -> HttpResponse {
    let oid = match parse_object_id(&id) {
        Ok(oid) => oid,
        Err(response) => return response,
    };
    let set = match body.to_set_document() {
        Ok(set) => set,
        Err(e) => return bad_request(e),
    };

    match db
        .collection::<MarketData>(MarketData::COLLECTION)
        .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => not_found("Market data not found"),
        Err(e) => server_error("Error updating market data", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_db;
    use crate::services::auth_service::generate_jwt;
    use actix_web::{http::StatusCode, test, App};
    use mongodb::bson::oid::ObjectId;

    #[::core::prelude::v1::test]
    fn test_invalid_role_rejected() {
        let request = UpdateRoleRequest { role: Some("superuser".into()), permissions: None };
        assert_eq!(role_update(&request).unwrap_err(), "Invalid role: superuser");

        let request = UpdateRoleRequest { role: Some("moderator".into()), permissions: Some(Permissions::all()) };
        let update = role_update(&request).unwrap();
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("role").unwrap(), "moderator");
        assert!(set.get_document("permissions").unwrap().get_bool("canModerateChat").unwrap());
    }

    #[::core::prelude::v1::test]
    fn test_resolving_feedback_stamps_resolver_and_pushes_reply() {
        let request = UpdateFeedbackRequest {
            status: Some(FeedbackStatus::Resolved),
            response: Some("Your slot has been rebooked.".into()),
        };
        let update = feedback_update(&request, "admin1", 42).unwrap();
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("status").unwrap(), "resolved");
        assert_eq!(set.get_i64("resolvedAt").unwrap(), 42);
        assert_eq!(set.get_str("resolvedBy").unwrap(), "admin1");

        let reply = update.get_document("$push").unwrap().get_document("responses").unwrap();
        assert!(reply.get_bool("isOfficial").unwrap());
        assert_eq!(reply.get_str("userId").unwrap(), "admin1");
    }

    #[::core::prelude::v1::test]
    fn test_in_progress_does_not_resolve() {
        let request = UpdateFeedbackRequest { status: Some(FeedbackStatus::InProgress), response: None };
        let update = feedback_update(&request, "admin1", 1).unwrap();
        assert!(!update.get_document("$set").unwrap().contains_key("resolvedAt"));
        assert!(!update.contains_key("$push"));

        let empty = UpdateFeedbackRequest { status: None, response: Some("  ".into()) };
        assert!(feedback_update(&empty, "admin1", 1).is_err());
    }

    #[::core::prelude::v1::test]
    fn test_feedback_and_user_filters() {
        let filter = build_feedback_filter(&FeedbackFilters {
            status: Some("open".into()),
            feedback_type: None,
            priority: Some("urgent".into()),
        });
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get_str("priority").unwrap(), "urgent");

        let filter = build_user_filter(&UserFilters { role: None, search: Some("asha".into()) });
        assert_eq!(filter.get_array("$or").unwrap().len(), 2);
    }

    async fn dashboard_status(db: &MongoDB, token: &str) -> StatusCode {
        let app = test::init_service(
            App::new().app_data(web::Data::new(db.clone())).configure(crate::api::configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        match test::try_call_service(&app, req).await {
            Ok(res) => res.status(),
            Err(err) => err.as_response_error().status_code(),
        }
    }

    async fn insert_user(db: &MongoDB, role: UserRole) -> User {
        let mut user = User {
            name: "Citizen".into(),
            email: format!("{}@example.in", ObjectId::new().to_hex()),
            role,
            ..User::default()
        };
        let result = db.collection::<User>(User::COLLECTION).insert_one(&user).await.unwrap();
        user.id = result.inserted_id.as_object_id();
        user
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthorized() {
        let app = test::init_service(App::new().configure(crate::api::configure)).await;
        let req = test::TestRequest::get().uri("/api/admin/dashboard").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_non_admin_is_forbidden() {
        let db = test_db().await;
        let user = insert_user(&db, UserRole::User).await;
        let token = generate_jwt(&user).unwrap();
        assert_eq!(dashboard_status(&db, &token).await, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_demoted_admin_loses_access_with_old_token() {
        let db = test_db().await;
        let admin = insert_user(&db, UserRole::Admin).await;
        let token = generate_jwt(&admin).unwrap();
        assert_eq!(dashboard_status(&db, &token).await, StatusCode::OK);

        db.collection::<User>(User::COLLECTION)
            .update_one(doc! { "_id": admin.id.unwrap() }, doc! { "$set": { "role": "user" } })
            .await
            .unwrap();
        assert_eq!(dashboard_status(&db, &token).await, StatusCode::FORBIDDEN);

        db.collection::<User>(User::COLLECTION)
            .delete_one(doc! { "_id": admin.id.unwrap() })
            .await
            .unwrap();
        assert_eq!(dashboard_status(&db, &token).await, StatusCode::UNAUTHORIZED);
    }
}
