use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::EmailError;
use crate::user::errors::UserError;
use crate::user::errors::UserIdError;

/// Registered user.
///
/// Credentials live in a separate account record, never on the user itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: EmailAddress,
    pub email_verified: bool,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh, non-admin user stamped with `now`.
    pub fn register(command: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name: command.name,
            email: command.email,
            email_verified: command.email_verified,
            phone: command.phone,
            image: command.image,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Trimmed and lowercased, so equality matches how the unique index compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let normalized = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the `@`, used as a display name when none was given.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub email_verified: bool,
}

/// Partial profile update.
///
/// Only fields that are present and non-empty make it into the command, and
/// a command always carries at least one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProfileCommand {
    name: Option<String>,
    phone: Option<String>,
    image: Option<String>,
}

impl UpdateProfileCommand {
    /// # Errors
    /// * `NoFieldsToUpdate` - Every field is absent or empty
    pub fn new(
        name: Option<String>,
        phone: Option<String>,
        image: Option<String>,
    ) -> Result<Self, UserError> {
        let command = Self {
            name: name.filter(|value| !value.is_empty()),
            phone: phone.filter(|value| !value.is_empty()),
            image: image.filter(|value| !value.is_empty()),
        };

        if command.name.is_none() && command.phone.is_none() && command.image.is_none() {
            return Err(UserError::NoFieldsToUpdate);
        }
        Ok(command)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Apply the present fields to `user`.
    pub fn apply(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(image) = &self.image {
            user.image = Some(image.clone());
        }
        user.updated_at = now;
    }
}
