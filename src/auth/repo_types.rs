use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Single-use code bound to one user. The same row type backs account
/// verification and password reset; the redeeming flow gives it meaning.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub code: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}
