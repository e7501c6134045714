use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::VerificationCode;
use crate::error::AppError;

#[async_trait]
pub trait CodeRepo: Send + Sync {
    async fn insert(&self, code: &str, user_id: Uuid) -> Result<VerificationCode, AppError>;

    /// Atomically removes the code and returns it, so that two concurrent
    /// redemptions of the same code can never both succeed.
    async fn take(&self, code: &str) -> Result<Option<VerificationCode>, AppError>;

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgCodeRepo {
    db: PgPool,
}

impl PgCodeRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CodeRepo for PgCodeRepo {
    async fn insert(&self, code: &str, user_id: Uuid) -> Result<VerificationCode, AppError> {
        let row = sqlx::query_as::<_, VerificationCode>(
            r#"
            INSERT INTO verification_codes (code, user_id)
            VALUES ($1, $2)
            RETURNING code, user_id, created_at
            "#,
        )
        .bind(code)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn take(&self, code: &str) -> Result<Option<VerificationCode>, AppError> {
        let row = sqlx::query_as::<_, VerificationCode>(
            r#"
            DELETE FROM verification_codes
             WHERE code = $1
            RETURNING code, user_id, created_at
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let res = sqlx::query("DELETE FROM verification_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
