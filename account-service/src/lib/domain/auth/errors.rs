use thiserror::Error;

use crate::user::errors::EmailError;
use crate::user::errors::UserError;

/// Error for outbound email delivery
#[derive(Debug, Clone, Error)]
pub enum EmailDeliveryError {
    #[error("Mail provider request failed: {0}")]
    RequestFailed(String),

    #[error("Mail provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Top-level error for credential and session operations
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Password too short")]
    PasswordTooShort { min: usize },

    #[error("Password too long")]
    PasswordTooLong { max: usize },

    #[error("Email and password sign up is not enabled")]
    SignUpDisabled,

    #[error("User already exists")]
    EmailAlreadyExists(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    User(UserError),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailAlreadyExists(email) => AuthError::EmailAlreadyExists(email),
            UserError::InvalidEmail(e) => AuthError::InvalidEmail(e),
            UserError::DatabaseError(e) => AuthError::DatabaseError(e),
            other => AuthError::User(other),
        }
    }
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        match err {
            auth::PasswordError::TooShort { min } => AuthError::PasswordTooShort { min },
            auth::PasswordError::TooLong { max } => AuthError::PasswordTooLong { max },
            other => AuthError::Credential(other.to_string()),
        }
    }
}

impl From<auth::TokenError> for AuthError {
    fn from(err: auth::TokenError) -> Self {
        AuthError::Token(err.to_string())
    }
}

impl From<auth::JwtError> for AuthError {
    fn from(err: auth::JwtError) -> Self {
        AuthError::Token(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Unknown(err.to_string())
    }
}
