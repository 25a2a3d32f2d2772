use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use mongodb::bson::{doc, oid::ObjectId};
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::database::MongoDB;
use crate::models::{User, UserRole};
use crate::services::auth_service::Claims;

/// Role gate for the admin scope. Must sit inside `AuthMiddleware`, which
/// supplies the `Claims`. The role is re-read from the users collection on
/// every request, so demotions and deletions apply before the token expires.
pub struct AdminAuth;

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthService { service: Rc::new(service) }))
    }
}

pub struct AdminAuthService<S> {
    service: Rc<S>,
}

/// Current role of the account behind a token, `None` when it no longer exists.
async fn current_role(db: &MongoDB, user_id: &str) -> Result<Option<UserRole>, String> {
    let Ok(oid) = ObjectId::parse_str(user_id) else {
        return Ok(None);
    };

    db.collection::<User>(User::COLLECTION)
        .find_one(doc! { "_id": oid })
        .await
        .map(|user| user.map(|u| u.role))
        .map_err(|e| format!("Database error: {}", e))
}

/// 401 for a vanished account, 403 for any role outside the admin set.
pub(crate) fn check_role(role: Option<UserRole>) -> Result<(), Error> {
    match role {
        None => Err(actix_web::error::ErrorUnauthorized("User not found")),
        Some(role) if role.is_admin() => Ok(()),
        Some(_) => Err(actix_web::error::ErrorForbidden("Access denied. Admin privileges required.")),
    }
}

impl<S, B> Service<ServiceRequest> for AdminAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(claims) = req.extensions().get::<Claims>().cloned() else {
            return Box::pin(async move {
                Err(actix_web::error::ErrorUnauthorized("No token, authorization denied"))
            });
        };
        let db = req.app_data::<web::Data<MongoDB>>().cloned();
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let Some(db) = db else {
                log::error!("❌ Admin check without a database handle on {}", req.path());
                return Err(actix_web::error::ErrorInternalServerError("Server error"));
            };

            let role = current_role(&db, &claims.sub).await.map_err(|e| {
                log::error!("❌ Admin check failed: {}", e);
                actix_web::error::ErrorInternalServerError("Server error")
            })?;

            if let Err(e) = check_role(role) {
                log::warn!("⚠️ {} denied {}: {:?}", claims.email, req.path(), role);
                return Err(e);
            }

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    fn status(result: Result<(), Error>) -> StatusCode {
        result.unwrap_err().as_response_error().status_code()
    }

    #[test]
    fn test_role_gate() {
        assert!(check_role(Some(UserRole::Admin)).is_ok());
        assert!(check_role(Some(UserRole::ServiceAdmin)).is_ok());
        assert_eq!(status(check_role(Some(UserRole::Moderator))), StatusCode::FORBIDDEN);
        assert_eq!(status(check_role(Some(UserRole::User))), StatusCode::FORBIDDEN);
        assert_eq!(status(check_role(None)), StatusCode::UNAUTHORIZED);
    }
}
