use crate::errors::{ApiError, Result};
use crate::models::{AnalysisRecord, User};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Most recent analyses returned per user
pub const HISTORY_LIMIT: i64 = 100;

const UNIQUE_VIOLATION: &str = "23505";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Fails with [`ApiError::UserExists`] when the email is taken
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User>;
}

#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn create_analysis(&self, user_id: Uuid, input: &Value, result: &Value) -> Result<Uuid>;

    /// Newest first, at most `limit`
    async fn analyses_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<AnalysisRecord>>;
}

/// Postgres-backed repository over an explicitly constructed pool
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1 LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, created_at)
             VALUES ($1, $2, $3, NOW())
             RETURNING id, email, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(ApiError::UserExists)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl AnalysisRepository for PgRepository {
    async fn create_analysis(&self, user_id: Uuid, input: &Value, result: &Value) -> Result<Uuid> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO analyses (id, user_id, input_json, result_json, created_at)
             VALUES ($1, $2, $3, $4, NOW())",
        )
        .bind(id)
        .bind(user_id)
        .bind(input)
        .bind(result)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn analyses_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<AnalysisRecord>> {
        let records = sqlx::query_as::<_, AnalysisRecord>(
            "SELECT id, user_id, input_json, result_json, created_at
             FROM analyses
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
