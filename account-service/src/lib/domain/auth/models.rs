use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Session unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Server-side session record.
///
/// Only the digest of the bearer token is kept; the raw token exists in the
/// client's cookie and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub token_hash: Vec<u8>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A live session together with its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: User,
    pub session: Session,
}

/// Session returned to the caller right after sign-in, with the raw token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
    pub user: User,
}

/// Request metadata recorded on new sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationPurpose {
    MagicLink,
    PasswordReset,
    EmailVerification,
}

impl VerificationPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationPurpose::MagicLink => "magic_link",
            VerificationPurpose::PasswordReset => "password_reset",
            VerificationPurpose::EmailVerification => "email_verification",
        }
    }
}

/// Single-use token bound to an email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub id: Uuid,
    pub identifier: String,
    pub purpose: VerificationPurpose,
    pub token_hash: Vec<u8>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Verification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Command to register a user with an email and password
#[derive(Debug, Clone)]
pub struct SignUpCommand {
    pub name: String,
    pub email: EmailAddress,
    pub password: String,
    pub phone: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: User,
    /// Present when auto sign-in is enabled
    pub session: Option<IssuedSession>,
}

/// Outbound email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl EmailMessage {
    pub fn magic_link(to: &EmailAddress, url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Sign in to your account".to_string(),
            text: format!("Click the link to sign in to your account: {url}"),
        }
    }

    pub fn password_reset(to: &EmailAddress, url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            text: format!("Click the link to reset your password: {url}"),
        }
    }

    pub fn email_verification(to: &EmailAddress, url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Verify your email".to_string(),
            text: format!("Click the link to verify your email: {url}"),
        }
    }
}

/// Knobs of the credential flows.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Public URL of the `/api/auth` surface, used to build emailed links
    pub base_url: String,
    pub password_policy: auth::PasswordPolicy,
    pub disable_sign_up: bool,
    pub auto_sign_in: bool,
    pub send_verification_on_sign_up: bool,
    pub session_expires_in: Duration,
    pub magic_link_expires_in: Duration,
    pub reset_password_expires_in: Duration,
    pub email_verification_expires_in: Duration,
    pub jwt_expires_in: Duration,
}

impl AuthSettings {
    /// Settings with the stock expiries and switches for `base_url`.
    pub fn with_defaults(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            password_policy: auth::PasswordPolicy::default(),
            disable_sign_up: false,
            auto_sign_in: true,
            send_verification_on_sign_up: true,
            session_expires_in: Duration::days(7),
            magic_link_expires_in: Duration::seconds(300),
            reset_password_expires_in: Duration::seconds(3600),
            email_verification_expires_in: Duration::seconds(3600),
            jwt_expires_in: Duration::seconds(900),
        }
    }
}
