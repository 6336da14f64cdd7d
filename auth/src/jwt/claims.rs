use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by tokens minted from an authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub email: String,
    pub name: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Build claims valid from `issued_at` for `lifetime`.
    ///
    /// # Arguments
    /// * `subject` - User identifier
    /// * `issuer` - Issuer URL, also used as the audience
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subject: impl ToString,
        email: impl Into<String>,
        name: impl Into<String>,
        is_admin: bool,
        issuer: impl Into<String>,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        let issuer = issuer.into();
        Self {
            sub: subject.to_string(),
            email: email.into(),
            name: name.into(),
            is_admin,
            aud: issuer.clone(),
            iss: issuer,
            iat: issued_at.timestamp(),
            exp: (issued_at + lifetime).timestamp(),
        }
    }
}
