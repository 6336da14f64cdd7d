use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::Verification;
use crate::domain::auth::models::VerificationPurpose;
use crate::domain::auth::ports::VerificationRepository;

pub struct PostgresVerificationRepository {
    pool: PgPool,
}

impl PostgresVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_verification(
        row: &PgRow,
        purpose: VerificationPurpose,
    ) -> Verification {
        Verification {
            id: row.get("id"),
            identifier: row.get("identifier"),
            purpose,
            token_hash: row.get("token_hash"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
        }
    }
}

fn database_error(e: sqlx::Error) -> AuthError {
    AuthError::DatabaseError(e.to_string())
}

#[async_trait]
impl VerificationRepository for PostgresVerificationRepository {
    async fn create(&self, verification: Verification) -> Result<Verification, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO verifications (id, identifier, purpose, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(verification.id)
        .bind(&verification.identifier)
        .bind(verification.purpose.as_str())
        .bind(&verification.token_hash)
        .bind(verification.expires_at)
        .bind(verification.created_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(verification)
    }

    async fn find(
        &self,
        token_hash: &[u8],
        purpose: VerificationPurpose,
    ) -> Result<Option<Verification>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, identifier, token_hash, expires_at, created_at
            FROM verifications
            WHERE token_hash = $1 AND purpose = $2
            "#,
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row
            .as_ref()
            .map(|row| Self::row_to_verification(row, purpose)))
    }

    async fn consume(
        &self,
        token_hash: &[u8],
        purpose: VerificationPurpose,
    ) -> Result<Option<Verification>, AuthError> {
        // DELETE .. RETURNING makes concurrent redemptions race for a single row
        let row = sqlx::query(
            r#"
            DELETE FROM verifications
            WHERE token_hash = $1 AND purpose = $2
            RETURNING id, identifier, token_hash, expires_at, created_at
            "#,
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row
            .as_ref()
            .map(|row| Self::row_to_verification(row, purpose)))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM verifications WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}
