//! PostgreSQL user repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use invenfinder_core::error::{AppError, ErrorKind};
use invenfinder_core::result::AppResult;
use invenfinder_entity::user::User;

use super::UserRepository;

/// `users` table access through `sqlx`.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn save(&self, user: &User) -> AppResult<()> {
        let permissions = i64::try_from(user.permissions)
            .map_err(|_| AppError::validation("Permission mask out of range"))?;

        sqlx::query(
            "INSERT INTO users (id, username, password_salt, password_hash, permissions, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                username = EXCLUDED.username, \
                password_salt = EXCLUDED.password_salt, \
                password_hash = EXCLUDED.password_hash, \
                permissions = EXCLUDED.permissions",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_salt)
        .bind(&user.password_hash)
        .bind(permissions)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(format!("Username '{}' is already taken", user.username))
                    .with_code("USERNAME_TAKEN")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to save user", e),
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;
        Ok(result.rows_affected() > 0)
    }
}
