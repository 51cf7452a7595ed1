//! Initial admin account from `ADMIN_EMAIL` / `ADMIN_PASSWORD`

use shared::error::AppError;
use shared::models::Role;
use sqlx::SqlitePool;

use crate::auth::password::{hash_password, verify_password};
use crate::config::Config;
use crate::db::users;
use crate::error::ServiceResult;

/// Create the configured admin, or promote the existing account
///
/// No-op unless both variables are set. An existing account is promoted only
/// when `ADMIN_PASSWORD` matches its stored hash.
pub async fn seed_admin(pool: &SqlitePool, config: &Config) -> ServiceResult<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    if let Some(existing) = users::find_by_email(pool, &email).await? {
        if existing.user.role == Role::Admin {
            return Ok(());
        }
        if !verify_password(password, &existing.password_hash) {
            tracing::error!(
                user_id = existing.user.id,
                "Seed admin email taken by another password, not promoting"
            );
            return Ok(());
        }
        users::set_role(pool, existing.user.id, Role::Admin).await?;
        tracing::info!(user_id = existing.user.id, "Promoted seed account to admin");
        return Ok(());
    }

    let hash = hash_password(password)
        .map_err(|e| AppError::internal(format!("Failed to hash admin password: {e}")))?;
    let user = users::create_user(pool, &email, &hash, "admin", Role::Admin).await?;
    tracing::info!(user_id = user.id, "Seeded admin account");
    Ok(())
}
