use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use time::OffsetDateTime;

/// User record in the database. Emails are stored lowercased, so the UNIQUE
/// constraint doubles as a case-insensitive uniqueness check.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: OffsetDateTime,
    pub is_active: bool,
}

#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl User {
    /// Insert a new user. The UNIQUE constraint is the authority on duplicate
    /// emails, so two concurrent registrations cannot both succeed.
    pub async fn create(
        db: &SqlitePool,
        email: &str,
        password_hash: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User, CreateUserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, created_at)
            VALUES (lower(?), ?, ?, ?, ?)
            RETURNING id, email, password_hash, first_name, last_name, created_at, is_active
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                CreateUserError::DuplicateEmail
            }
            _ => CreateUserError::Database(e),
        })?;
        Ok(user)
    }

    /// Case-insensitive lookup, regardless of activation state.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, created_at, is_active
            FROM users
            WHERE email = lower(?)
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Lookup by id; deactivated users are invisible here.
    pub async fn find_active_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, created_at, is_active
            FROM users
            WHERE id = ? AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}
