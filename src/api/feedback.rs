use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::api::{bad_request, server_error};
use crate::database::MongoDB;
use crate::middleware::auth::bearer_token;
use crate::models::{CreateFeedbackRequest, ServiceFeedback};
use crate::services::auth_service::verify_token;

/// Caller id when a valid token is attached. Feedback does not require login.
fn optional_user_id(req: &HttpRequest) -> Option<String> {
    let token = bearer_token(req.headers())?;
    verify_token(token).ok().map(|claims| claims.sub)
}

#[utoipa::path(
    post,
    path = "/api/feedback",
    tag = "Feedback",
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded with status open", body = ServiceFeedback),
        (status = 400, description = "Missing or invalid field")
    )
)]
pub async fn submit_feedback(
    req: HttpRequest,
    db: web::Data<MongoDB>,
    body: web::Json<CreateFeedbackRequest>,
) -> HttpResponse {
    let mut feedback = match body.into_inner().into_feedback(optional_user_id(&req)) {
        Ok(feedback) => feedback,
        Err(e) => return bad_request(e),
    };

    match db
        .collection::<ServiceFeedback>(ServiceFeedback::COLLECTION)
        .insert_one(&feedback)
        .await
    {
        Ok(result) => {
            feedback.id = result.inserted_id.as_object_id();
            log::info!(
                "📝 Feedback received for service {} ({:?}, {:?})",
                feedback.service_id,
                feedback.feedback_type,
                feedback.priority
            );
            HttpResponse::Created().json(json!({
                "success": true,
                "message": "Feedback submitted successfully",
                "feedback": feedback
            }))
        }
        Err(e) => server_error("Error submitting feedback", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_db;
    use crate::models::FeedbackStatus;
    use actix_web::{http::StatusCode, test, App};
    use mongodb::bson::{doc, oid::ObjectId};

    #[actix_web::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_feedback_is_persisted_as_open() {
        let db = test_db().await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(db.clone())).configure(crate::api::configure),
        )
        .await;

        let service_id = ObjectId::new().to_hex();
        let req = test::TestRequest::post()
            .uri("/api/feedback")
            .set_json(json!({
                "serviceId": service_id,
                "type": "suggestion",
                "subject": "Add Marathi",
                "message": "Please add Marathi to the passport page",
                "rating": 4
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let stored = db
            .collection::<ServiceFeedback>(ServiceFeedback::COLLECTION)
            .find_one(doc! { "serviceId": &service_id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, FeedbackStatus::Open);
        assert!(stored.user_id.is_none());
    }

    #[actix_web::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_missing_subject_is_400() {
        let db = test_db().await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(db)).configure(crate::api::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/feedback")
            .set_json(json!({ "serviceId": ObjectId::new().to_hex(), "type": "complaint", "message": "x" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["error"], "subject is required");
    }
}
