use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.repository.list_all().await
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError> {
        let user = self
            .repository
            .update_profile(id, &command, Utc::now())
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    async fn set_admin(&self, id: &UserId, is_admin: bool) -> Result<User, UserError> {
        let user = self
            .repository
            .set_admin(id, is_admin, Utc::now())
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        tracing::info!(user_id = %user.id, is_admin, "Admin flag changed");
        Ok(user)
    }
}
