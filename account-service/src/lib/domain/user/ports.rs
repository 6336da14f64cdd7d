use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// List every user, newest first.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_users(&self) -> Result<Vec<User>, UserError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Arguments
    /// * `id` - User ID
    ///
    /// # Returns
    /// User entity
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, UserError>;

    /// Apply a partial profile update and return the stored result.
    ///
    /// # Arguments
    /// * `id` - User whose profile changes
    /// * `command` - Non-empty set of fields to overwrite
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_profile(
        &self,
        id: &UserId,
        command: UpdateProfileCommand,
    ) -> Result<User, UserError>;

    /// Grant or revoke the admin flag.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn set_admin(&self, id: &UserId, is_admin: bool) -> Result<User, UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// # Returns
    /// User if found, None otherwise
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// # Returns
    /// User if found, None otherwise
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// All users ordered by creation time, newest first.
    async fn list_all(&self) -> Result<Vec<User>, UserError>;

    /// Overwrite the fields present in `command` in a single write.
    ///
    /// # Returns
    /// Updated user, None if it does not exist
    async fn update_profile(
        &self,
        id: &UserId,
        command: &UpdateProfileCommand,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserError>;

    /// # Returns
    /// Updated user, None if it does not exist
    async fn set_admin(
        &self,
        id: &UserId,
        is_admin: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserError>;

    /// # Returns
    /// Updated user, None if it does not exist
    async fn mark_email_verified(
        &self,
        id: &UserId,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserError>;
}
