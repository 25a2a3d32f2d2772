use actix_web::{web, HttpResponse};

use crate::api::{error_json, server_error};
use crate::services::auth_service::{
    self, AuthResponse, Claims, LoginRequest, RegisterError, RegisterRequest,
};
use crate::{database::MongoDB, models::User};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid request or user already exists"),
        (status = 500, description = "Storage or hashing failure")
    )
)]
pub async fn register(db: web::Data<MongoDB>, request: web::Json<RegisterRequest>) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /auth/register - email: {}", email);

    match auth_service::register(&db, &request).await {
        Ok(response) => HttpResponse::Created().json(response),
        Err(e) => registration_error(email, e),
    }
}

fn registration_error(email: &str, e: RegisterError) -> HttpResponse {
    match e {
        RegisterError::Rejected(reason) => {
            log::warn!("❌ Registration failed: {} - {}", email, reason);
            error_json(HttpResponse::BadRequest(), reason)
        }
        RegisterError::Internal(reason) => server_error("Registration error", reason),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(db: web::Data<MongoDB>, request: web::Json<LoginRequest>) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("🔐 POST /auth/login - email: {}", email);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", email);
            HttpResponse::Ok().json(response)
        }
        Err(e) if e == "Invalid credentials" => {
            log::warn!("❌ Login failed: {}", email);
            error_json(HttpResponse::Unauthorized(), e)
        }
        Err(e) => server_error("Login error", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user without password", body = User),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(db: web::Data<MongoDB>, claims: web::ReqData<Claims>) -> HttpResponse {
    match auth_service::get_current_user(&db, &claims.sub).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) if e == "User not found" => error_json(HttpResponse::NotFound(), e),
        Err(e) => server_error("Failed to load current user", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[::core::prelude::v1::test]
    fn test_registration_errors_split_client_and_server_faults() {
        let rejected = registration_error("a@b.in", RegisterError::Rejected("User already exists".into()));
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let internal = registration_error("a@b.in", RegisterError::Internal("Database error: timeout".into()));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_me_requires_token() {
        let app = test::init_service(App::new().configure(crate::api::configure)).await;
        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), 401);
    }
}
