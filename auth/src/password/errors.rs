use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("Password is too short, minimum length is {min}")]
    TooShort { min: usize },

    #[error("Password is too long, maximum length is {max}")]
    TooLong { max: usize },

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Stored password hash is unreadable: {0}")]
    MalformedHash(String),
}
