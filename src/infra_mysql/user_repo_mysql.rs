use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    #[inline]
    fn uid_as_bytes(id: &UserId) -> &[u8] {
        id.0.as_bytes()
    }

    #[inline]
    fn uid_from_bytes(id: &[u8]) -> Result<UserId, AuthError> {
        Ok(UserId(
            Uuid::from_slice(id).map_err(|e| AuthError::Store(e.to_string()))?,
        ))
    }

    fn row_to_user(row: MySqlRow) -> Result<User, AuthError> {
        let user_id_bytes: Vec<u8> = row
            .try_get("user_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let id = Self::uid_from_bytes(&user_id_bytes)?;

        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let display_name: String = row
            .try_get("display_name")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let is_active: bool = row
            .try_get("is_active")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(User {
            id,
            email,
            password_hash,
            display_name,
            is_active,
            created_at,
            updated_at,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email, password_hash, display_name, is_active, created_at, updated_at
FROM user
WHERE email = ? AND is_active = 1
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_user).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, email, password_hash, display_name, is_active, created_at, updated_at
FROM user
WHERE user_id = ? AND is_active = 1
"#,
        )
        .bind(Self::uid_as_bytes(&user_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_user).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        sqlx::query(
            r#"
INSERT INTO user (user_id, email, password_hash, display_name, is_active, created_at, updated_at)
VALUES (?, ?, ?, ?, 1, ?, ?)
"#,
        )
        .bind(Self::uid_as_bytes(&user.id))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.created_at)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::AlreadyExists
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        Ok(user.into_user())
    }

    async fn deactivate(&self, user_id: UserId) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
UPDATE user
SET is_active = 0, updated_at = CURRENT_TIMESTAMP(6)
WHERE user_id = ? AND is_active = 1
"#,
        )
        .bind(Self::uid_as_bytes(&user_id))
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(format!("deactivate user: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
