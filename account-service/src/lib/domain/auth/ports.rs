use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::EmailDeliveryError;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::ClientInfo;
use crate::domain::auth::models::EmailMessage;
use crate::domain::auth::models::IssuedSession;
use crate::domain::auth::models::Session;
use crate::domain::auth::models::SessionId;
use crate::domain::auth::models::SignUpCommand;
use crate::domain::auth::models::SignUpOutcome;
use crate::domain::auth::models::Verification;
use crate::domain::auth::models::VerificationPurpose;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Boundary owning every credential and session decision.
///
/// HTTP handlers translate requests into these calls and never touch hashes,
/// tokens or the session store directly.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    /// Look up the live session behind a raw bearer token.
    ///
    /// # Returns
    /// Session and owner, None when the token is unknown, expired, or its
    /// owner no longer exists
    ///
    /// # Errors
    /// * `DatabaseError` - Session store unavailable
    async fn resolve_session(&self, token: &str) -> Result<Option<AuthSession>, AuthError>;

    /// Start a new session for `user`.
    ///
    /// # Errors
    /// * `Token` - Random source unavailable
    /// * `DatabaseError` - Session could not be stored
    async fn issue_session(&self, user: User, client: ClientInfo)
        -> Result<IssuedSession, AuthError>;

    /// Check an email and password pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, no password set, or mismatch
    async fn verify_credential(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<User, AuthError>;

    /// Register a user with a password credential.
    ///
    /// # Errors
    /// * `SignUpDisabled` - Email and password sign-up is switched off
    /// * `PasswordTooShort` / `PasswordTooLong` - Password outside policy
    /// * `EmailAlreadyExists` - Email is already registered
    async fn sign_up(
        &self,
        command: SignUpCommand,
        client: ClientInfo,
    ) -> Result<SignUpOutcome, AuthError>;

    /// Revoke the session behind `token`. Unknown tokens are ignored.
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// Email a single-use sign-in link.
    async fn send_magic_link(
        &self,
        email: &EmailAddress,
        callback_url: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Consume a magic-link token and sign its owner in, creating the user on
    /// first use.
    ///
    /// # Errors
    /// * `InvalidToken` - Unknown, used, or expired token
    async fn verify_magic_link(
        &self,
        token: &str,
        client: ClientInfo,
    ) -> Result<IssuedSession, AuthError>;

    /// Email a password reset link when the address belongs to a user.
    ///
    /// Succeeds silently for unknown addresses.
    async fn request_password_reset(
        &self,
        email: &EmailAddress,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Whether a reset token is known and unexpired, without consuming it.
    async fn check_reset_token(&self, token: &str) -> Result<bool, AuthError>;

    /// Set a new password from a reset token and revoke every session of the
    /// user.
    ///
    /// # Errors
    /// * `InvalidToken` - Unknown, used, or expired token
    /// * `PasswordTooShort` / `PasswordTooLong` - Password outside policy
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;

    /// Replace the password of the signed-in user.
    ///
    /// # Errors
    /// * `InvalidPassword` - `current_password` does not match
    /// * `PasswordTooShort` / `PasswordTooLong` - Password outside policy
    async fn change_password(
        &self,
        auth_session: &AuthSession,
        current_password: &str,
        new_password: &str,
        revoke_other_sessions: bool,
    ) -> Result<User, AuthError>;

    /// Consume an email verification token.
    ///
    /// # Errors
    /// * `InvalidToken` - Unknown, used, or expired token
    async fn verify_email(&self, token: &str) -> Result<User, AuthError>;

    /// Mint a short-lived JWT describing the session owner.
    fn issue_token(&self, auth_session: &AuthSession) -> Result<String, AuthError>;

    /// Key set published at `/.well-known/jwks.json`.
    fn jwks(&self) -> serde_json::Value;
}

/// Persistence operations for sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    async fn create(&self, session: Session) -> Result<Session, AuthError>;

    /// # Returns
    /// Session if found, expired or not
    async fn find_by_token_hash(&self, token_hash: &[u8]) -> Result<Option<Session>, AuthError>;

    async fn delete_by_token_hash(&self, token_hash: &[u8]) -> Result<(), AuthError>;

    /// # Returns
    /// Number of sessions removed
    async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, AuthError>;

    /// # Returns
    /// Number of sessions removed
    async fn delete_for_user_except(
        &self,
        user_id: &UserId,
        keep: &SessionId,
    ) -> Result<u64, AuthError>;

    /// # Returns
    /// Number of sessions that had expired before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}

/// Persistence operations for password credentials.
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Store a new user together with its password credential.
    ///
    /// Either both records exist afterwards or neither does.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    async fn create_user_with_password(
        &self,
        user: User,
        password_hash: &str,
    ) -> Result<User, AuthError>;

    /// Insert or replace the password hash of `user_id`.
    async fn upsert_password(
        &self,
        user_id: &UserId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// # Returns
    /// PHC hash if the user has a password credential
    async fn find_password_hash(&self, user_id: &UserId) -> Result<Option<String>, AuthError>;
}

/// Persistence operations for single-use verification tokens.
#[async_trait]
pub trait VerificationRepository: Send + Sync + 'static {
    async fn create(&self, verification: Verification) -> Result<Verification, AuthError>;

    /// Look a token up without consuming it.
    async fn find(
        &self,
        token_hash: &[u8],
        purpose: VerificationPurpose,
    ) -> Result<Option<Verification>, AuthError>;

    /// Delete a token and return it, so each token is usable once.
    async fn consume(
        &self,
        token_hash: &[u8],
        purpose: VerificationPurpose,
    ) -> Result<Option<Verification>, AuthError>;

    /// # Returns
    /// Number of tokens that had expired before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}

/// Outbound mail delivery.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailDeliveryError>;
}
