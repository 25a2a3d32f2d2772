use crate::{
    database::MongoDB,
    models::{now_millis, User, UserRole},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const MIN_PASSWORD_LENGTH: usize = 6;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user id (hex ObjectId)
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

impl Claims {
    pub fn has_admin_role(&self) -> bool {
        self.roles
            .iter()
            .filter_map(|r| UserRole::parse(r))
            .any(|r| r.is_admin())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "civic-portal-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "civic-portal-api".to_string())
}

pub fn hash_password(password: &str) -> Result<String, String> {
    hash(password, DEFAULT_COST).map_err(|e| format!("Failed to hash password: {}", e))
}

pub fn generate_jwt(user: &User) -> Result<String, String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id_hex(),
        email: user.email.clone(),
        name: Some(user.name.clone()),
        roles: vec![user.role.as_str().to_string()],
        is_active: true,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(7)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| format!("Failed to generate token: {}", e))
}

pub fn verify_token(token: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Why a registration did not go through. `Rejected` is the caller's fault
/// (bad input, duplicate email); `Internal` is a storage or hashing failure.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Internal(String),
}

/// Trimmed name, normalised email and raw password from a registration body.
pub fn validate_registration(request: &RegisterRequest) -> Result<(&str, String, &str), String> {
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or("Name is required")?;
    let email = request
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| e.contains('@'))
        .ok_or("A valid email is required")?;
    let password = request.password.as_deref().ok_or("Password is required")?;

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }

    Ok((name, email, password))
}

pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<AuthResponse, RegisterError> {
    let (name, email, password) = validate_registration(request).map_err(RegisterError::Rejected)?;

    let collection = db.collection::<User>(User::COLLECTION);

    if collection
        .find_one(doc! { "email": &email })
        .await
        .map_err(|e| RegisterError::Internal(format!("Database error: {}", e)))?
        .is_some()
    {
        return Err(RegisterError::Rejected("User already exists".to_string()));
    }

    let now = now_millis();
    let mut user = User {
        name: name.to_string(),
        email: email.clone(),
        password: Some(hash_password(password).map_err(RegisterError::Internal)?),
        last_login: Some(now),
        login_count: 1,
        created_at: now,
        updated_at: now,
        ..User::default()
    };

    let result = collection
        .insert_one(&user)
        .await
        .map_err(|e| RegisterError::Internal(format!("Failed to create user: {}", e)))?;
    user.id = result.inserted_id.as_object_id();

    let token = generate_jwt(&user).map_err(RegisterError::Internal)?;

    log::info!("✅ User registered successfully: {}", email);

    Ok(AuthResponse {
        success: true,
        token,
        user: user.without_password(),
    })
}

pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, String> {
    let email = request
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .ok_or("Invalid credentials")?;
    let password = request.password.as_deref().ok_or("Invalid credentials")?;

    let collection = db.collection::<User>(User::COLLECTION);

    let mut user = collection
        .find_one(doc! { "email": &email })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "Invalid credentials".to_string())?;

    let stored_password = user
        .password
        .as_deref()
        .ok_or_else(|| "Invalid credentials".to_string())?;

    let valid = verify(password, stored_password)
        .map_err(|e| format!("Password verification error: {}", e))?;

    if !valid {
        return Err("Invalid credentials".to_string());
    }

    let now = now_millis();
    if let Some(id) = user.id {
        collection
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": { "lastLogin": now, "updatedAt": now },
                    "$inc": { "loginCount": 1_i64 },
                },
            )
            .await
            .map_err(|e| format!("Failed to update user: {}", e))?;
    }
    user.last_login = Some(now);
    user.login_count += 1;

    let token = generate_jwt(&user)?;

    Ok(AuthResponse {
        success: true,
        token,
        user: user.without_password(),
    })
}

pub async fn get_current_user(db: &MongoDB, user_id: &str) -> Result<User, String> {
    let oid = ObjectId::parse_str(user_id).map_err(|_| "Invalid user id".to_string())?;

    db.collection::<User>(User::COLLECTION)
        .find_one(doc! { "_id": oid })
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .map(User::without_password)
        .ok_or_else(|| "User not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: UserRole) -> User {
        User {
            id: Some(ObjectId::new()),
            name: "Asha".into(),
            email: "asha@example.in".into(),
            role,
            ..User::default()
        }
    }

    #[test]
    fn test_registration_validation() {
        let request = RegisterRequest {
            name: Some("  Asha ".into()),
            email: Some(" Asha@Example.IN ".into()),
            password: Some("secret1".into()),
        };
        let (name, email, _) = validate_registration(&request).unwrap();
        assert_eq!(name, "Asha");
        assert_eq!(email, "asha@example.in");

        let short = RegisterRequest { password: Some("abc".into()), ..request };
        assert_eq!(
            validate_registration(&short).unwrap_err(),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_token_round_trip_keeps_role() {
        let user = user_with_role(UserRole::ServiceAdmin);
        let token = generate_jwt(&user).unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id_hex());
        assert_eq!(claims.roles, vec!["service_admin".to_string()]);
        assert!(claims.has_admin_role());
    }

    #[test]
    fn test_plain_user_is_not_admin() {
        let token = generate_jwt(&user_with_role(UserRole::User)).unwrap();
        assert!(!verify_token(&token).unwrap().has_admin_role());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let token = generate_jwt(&user_with_role(UserRole::User)).unwrap();
        let tampered = format!("{}x", token);
        assert!(verify_token(&tampered).is_err());
    }

    #[test]
    fn test_hash_password_verifies() {
        let hashed = hash_password("admin123").unwrap();
        assert!(verify("admin123", &hashed).unwrap());
        assert!(!verify("admin124", &hashed).unwrap());
    }
}
