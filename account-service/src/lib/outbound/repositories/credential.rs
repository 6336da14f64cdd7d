use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgExecutor;
use sqlx::PgPool;
use sqlx::Row;

use super::user::insert_user;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::CredentialRepository;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Provider id of email and password accounts
const CREDENTIAL_PROVIDER: &str = "credential";

pub struct PostgresCredentialRepository {
    pool: PgPool,
}

impl PostgresCredentialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn database_error(e: sqlx::Error) -> AuthError {
    AuthError::DatabaseError(e.to_string())
}

async fn upsert_password_with<'e, E>(
    executor: E,
    user_id: &UserId,
    password_hash: &str,
    updated_at: DateTime<Utc>,
) -> Result<(), AuthError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO accounts (user_id, provider_id, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        ON CONFLICT (user_id, provider_id)
        DO UPDATE SET password_hash = EXCLUDED.password_hash, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(user_id.0)
    .bind(CREDENTIAL_PROVIDER)
    .bind(password_hash)
    .bind(updated_at)
    .execute(executor)
    .await
    .map_err(database_error)?;

    Ok(())
}

#[async_trait]
impl CredentialRepository for PostgresCredentialRepository {
    async fn create_user_with_password(
        &self,
        user: User,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        // dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        insert_user(&mut *tx, &user).await?;
        upsert_password_with(&mut *tx, &user.id, password_hash, user.created_at).await?;

        tx.commit().await.map_err(database_error)?;
        Ok(user)
    }

    async fn upsert_password(
        &self,
        user_id: &UserId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        upsert_password_with(&self.pool, user_id, password_hash, updated_at).await
    }

    async fn find_password_hash(&self, user_id: &UserId) -> Result<Option<String>, AuthError> {
        let row = sqlx::query(
            "SELECT password_hash FROM accounts WHERE user_id = $1 AND provider_id = $2",
        )
        .bind(user_id.0)
        .bind(CREDENTIAL_PROVIDER)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.and_then(|row| row.get::<Option<String>, _>("password_hash")))
    }
}
