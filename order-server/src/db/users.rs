//! User queries

use shared::error::{AppError, ErrorCode};
use shared::models::{Role, User};
use shared::util::now_millis;
use sqlx::SqlitePool;

use crate::error::{ServiceResult, is_unique_violation};

const USER_COLUMNS: &str = "id, email, password_hash, name, role, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    name: String,
    role: String,
    created_at: i64,
    updated_at: i64,
}

/// User plus the stored password hash, for credential checks only
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

impl UserRow {
    fn into_credentials(self) -> ServiceResult<UserCredentials> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| AppError::internal(format!("Corrupt user role: {e}")))?;
        Ok(UserCredentials {
            user: User {
                id: self.id,
                email: self.email,
                name: self.name,
                role,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            password_hash: self.password_hash,
        })
    }
}

/// Lookup by email (already normalised to lowercase by the caller)
pub async fn find_by_email(
    pool: &SqlitePool,
    email: &str,
) -> ServiceResult<Option<UserCredentials>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?
        .map(UserRow::into_credentials)
        .transpose()
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> ServiceResult<User> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound).with_detail("id", id))?;
    Ok(row.into_credentials()?.user)
}

/// Insert a user; a taken email is a conflict
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    name: &str,
    role: Role,
) -> ServiceResult<User> {
    let now = now_millis();
    let sql = format!(
        "INSERT INTO users (email, password_hash, name, role, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING {USER_COLUMNS}"
    );
    let result = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(role.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await;

    match result {
        Ok(row) => Ok(row.into_credentials()?.user),
        Err(e) if is_unique_violation(&e) => Err(AppError::new(ErrorCode::EmailAlreadyRegistered)
            .with_detail("email", email)
            .into()),
        Err(e) => Err(e.into()),
    }
}

/// Every account, newest first; hashes never leave this module
pub async fn list_users(pool: &SqlitePool) -> ServiceResult<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
    sqlx::query_as::<_, UserRow>(&sql)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| row.into_credentials().map(|c| c.user))
        .collect()
}

/// Promote an existing account to admin
pub async fn set_role(pool: &SqlitePool, id: i64, role: Role) -> ServiceResult<()> {
    sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let pool = test_support::pool().await;
        let user = create_user(&pool, "amy@example.com", "hash", "amy", Role::Customer)
            .await
            .unwrap();
        assert_eq!(user.role, Role::Customer);

        let creds = find_by_email(&pool, "amy@example.com").await.unwrap().unwrap();
        assert_eq!(creds.user.id, user.id);
        assert_eq!(creds.password_hash, "hash");
        assert!(find_by_email(&pool, "nobody@example.com").await.unwrap().is_none());

        set_role(&pool, user.id, Role::Admin).await.unwrap();
        assert_eq!(find_by_id(&pool, user.id).await.unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = test_support::pool().await;
        create_user(&pool, "amy@example.com", "h", "amy", Role::Customer)
            .await
            .unwrap();
        let err: AppError = create_user(&pool, "amy@example.com", "h", "amy", Role::Customer)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::EmailAlreadyRegistered);
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_list_users_newest_first() {
        let pool = test_support::pool().await;
        assert!(list_users(&pool).await.unwrap().is_empty());

        let amy = create_user(&pool, "amy@example.com", "h", "amy", Role::Customer)
            .await
            .unwrap();
        let bob = create_user(&pool, "bob@example.com", "h", "bob", Role::Admin)
            .await
            .unwrap();

        let ids: Vec<i64> = list_users(&pool).await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![bob.id, amy.id]);
    }

    #[tokio::test]
    async fn test_find_missing_user() {
        let pool = test_support::pool().await;
        let err: AppError = find_by_id(&pool, 9).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::UserNotFound);
    }
}
