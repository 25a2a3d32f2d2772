use mongodb::bson::doc;

use crate::database::MongoDB;
use crate::models::{now_millis, Permissions, User, UserRole};
use crate::services::auth_service::hash_password;

pub const ADMIN_EMAIL: &str = "admin@digitalindia.gov.in";
pub const ADMIN_NAME: &str = "System Administrator";
const ADMIN_DEFAULT_PASSWORD: &str = "admin123";

/// Default administrator with a freshly hashed password.
pub fn build_admin_user() -> Result<User, String> {
    let now = now_millis();
    Ok(User {
        id: None,
        name: ADMIN_NAME.to_string(),
        email: ADMIN_EMAIL.to_string(),
        password: Some(hash_password(ADMIN_DEFAULT_PASSWORD)?),
        role: UserRole::Admin,
        permissions: Permissions::all(),
        is_verified: true,
        created_at: now,
        updated_at: now,
        ..User::default()
    })
}

/// Creates the administrator account unless one already exists.
/// Returns `true` when a new account was inserted.
pub async fn seed_admin(db: &MongoDB) -> Result<bool, String> {
    let users = db.collection::<User>(User::COLLECTION);

    let existing = users
        .find_one(doc! { "email": ADMIN_EMAIL })
        .await
        .map_err(|e| format!("Failed to look up admin: {}", e))?;

    if existing.is_some() {
        log::info!("👤 Admin {} already exists, skipping", ADMIN_EMAIL);
        return Ok(false);
    }

    let admin = build_admin_user()?;
    users
        .insert_one(&admin)
        .await
        .map_err(|e| format!("Failed to create admin: {}", e))?;

    log::info!("✅ Admin user created: {}", ADMIN_EMAIL);
    log::warn!("⚠️  Change the default admin password after first login");
    Ok(true)
}

/// Removes the administrator account. Returns the number of deleted users.
pub async fn delete_admin(db: &MongoDB) -> Result<u64, String> {
    let result = db
        .collection::<User>(User::COLLECTION)
        .delete_many(doc! { "email": ADMIN_EMAIL })
        .await
        .map_err(|e| format!("Failed to delete admin: {}", e))?;

    if result.deleted_count == 0 {
        log::info!("👤 No admin user found for {}", ADMIN_EMAIL);
    } else {
        log::info!("🗑️  Deleted admin user {}", ADMIN_EMAIL);
    }
    Ok(result.deleted_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_db;

    #[test]
    fn test_admin_has_every_permission_and_verified_hash() {
        let admin = build_admin_user().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(admin.is_verified);
        assert!(admin.permissions.can_create_services);
        assert!(admin.permissions.can_access_analytics);
        let hash = admin.password.unwrap();
        assert_ne!(hash, ADMIN_DEFAULT_PASSWORD);
        assert!(bcrypt::verify(ADMIN_DEFAULT_PASSWORD, &hash).unwrap());
    }

    #[actix_web::test]
    #[ignore = "requires a running MongoDB"]
    async fn test_reseeding_keeps_a_single_admin() {
        let db = test_db().await;
        delete_admin(&db).await.unwrap();

        assert!(seed_admin(&db).await.unwrap());
        assert!(!seed_admin(&db).await.unwrap());

        let users = db.collection::<User>(User::COLLECTION);
        let count = users.count_documents(doc! { "email": ADMIN_EMAIL }).await.unwrap();
        assert_eq!(count, 1);

        let stored = users.find_one(doc! { "email": ADMIN_EMAIL }).await.unwrap().unwrap();
        assert!(bcrypt::verify(ADMIN_DEFAULT_PASSWORD, stored.password.as_deref().unwrap()).unwrap());
    }
}
