use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgExecutor;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USER_COLUMNS: &str =
    "id, name, email, email_verified, phone, image, is_admin, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &PgRow) -> Result<User, UserError> {
        Ok(User {
            id: UserId(row.get("id")),
            name: row.get("name"),
            email: EmailAddress::new(row.get("email"))?,
            email_verified: row.get("email_verified"),
            phone: row.get("phone"),
            image: row.get("image"),
            is_admin: row.get("is_admin"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn optional_user(row: Option<PgRow>) -> Result<Option<User>, UserError> {
        row.as_ref().map(Self::row_to_user).transpose()
    }
}

fn database_error(e: sqlx::Error) -> UserError {
    UserError::DatabaseError(e.to_string())
}

/// Insert a user row through any executor, so registration can run it inside
/// a transaction.
pub(crate) async fn insert_user<'e, E>(executor: E, user: &User) -> Result<(), UserError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, email_verified, phone, image, is_admin, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(user.id.0)
    .bind(&user.name)
    .bind(user.email.as_str())
    .bind(user.email_verified)
    .bind(&user.phone)
    .bind(&user.image)
    .bind(user.is_admin)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(executor)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
                return UserError::EmailAlreadyExists(user.email.to_string());
            }
        }
        database_error(e)
    })?;

    Ok(())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        insert_user(&self.pool, &user).await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        Self::optional_user(row)
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        Self::optional_user(row)
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(Self::row_to_user).collect()
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: &UpdateProfileCommand,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                image = COALESCE($4, image),
                updated_at = $5
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id.0)
        .bind(command.name())
        .bind(command.phone())
        .bind(command.image())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Self::optional_user(row)
    }

    async fn set_admin(
        &self,
        id: &UserId,
        is_admin: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!(
            "UPDATE users SET is_admin = $2, updated_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(is_admin)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Self::optional_user(row)
    }

    async fn mark_email_verified(
        &self,
        id: &UserId,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!(
            "UPDATE users SET email_verified = TRUE, updated_at = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.0)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Self::optional_user(row)
    }
}
