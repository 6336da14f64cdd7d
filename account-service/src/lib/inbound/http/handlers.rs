use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::Session;
use crate::domain::user::models::User;
use crate::user::errors::UserError;

pub mod auth;
pub mod system;
pub mod users;
pub mod well_known;

/// Successful response with a bare JSON body.
#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<T>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// `{success: true, message, data}` envelope used by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiMessage<T: Serialize + PartialEq> {
    success: bool,
    message: String,
    data: T,
}

impl<T: Serialize + PartialEq> ApiMessage<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound { message: String, error: Option<String> },
    Conflict(String),
    Unauthorized { message: String, error: Option<String> },
    Forbidden { message: String, error: Option<String> },
}

impl ApiError {
    /// 401 for requests without a usable session
    pub fn no_session() -> Self {
        ApiError::Unauthorized {
            message: "Unauthorized".to_string(),
            error: Some("No valid session found".to_string()),
        }
    }

    /// 403 for signed-in users without the admin flag
    pub fn not_admin() -> Self {
        ApiError::Forbidden {
            message: "Unauthorized".to_string(),
            error: Some("User is not an admin".to_string()),
        }
    }

    pub fn user_not_found() -> Self {
        ApiError::NotFound {
            message: "User not found".to_string(),
            error: Some("No user found with the provided ID".to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, error) = match self {
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound { message, error } => (StatusCode::NOT_FOUND, message, error),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Unauthorized { message, error } => (StatusCode::UNAUTHORIZED, message, error),
            ApiError::Forbidden { message, error } => (StatusCode::FORBIDDEN, message, error),
        };

        (status, Json(ApiErrorBody::new(message, error))).into_response()
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) | UserError::InvalidUserId(_) => ApiError::user_not_found(),
            UserError::NoFieldsToUpdate => ApiError::BadRequest(err.to_string()),
            UserError::EmailAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            UserError::InvalidEmail(_) => ApiError::UnprocessableEntity(err.to_string()),
            UserError::DatabaseError(_) | UserError::Unknown(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized {
                message: err.to_string(),
                error: None,
            },
            AuthError::InvalidPassword
            | AuthError::InvalidToken
            | AuthError::PasswordTooShort { .. }
            | AuthError::PasswordTooLong { .. } => ApiError::BadRequest(err.to_string()),
            AuthError::SignUpDisabled => ApiError::Forbidden {
                message: err.to_string(),
                error: None,
            },
            AuthError::EmailAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            AuthError::InvalidEmail(_) => ApiError::UnprocessableEntity(err.to_string()),
            AuthError::User(user_error) => ApiError::from(user_error),
            AuthError::Credential(_)
            | AuthError::Token(_)
            | AuthError::DatabaseError(_)
            | AuthError::Unknown(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

/// `{success: false, message, error?}` envelope shared by every failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiErrorBody {
    pub fn new(message: String, error: Option<String>) -> Self {
        Self {
            success: false,
            message,
            error,
        }
    }
}

/// JSON view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email.to_string(),
            email_verified: user.email_verified,
            phone: user.phone,
            image: user.image,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// JSON view of a session; the token digest never leaves the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<Session> for SessionData {
    fn from(session: Session) -> Self {
        Self {
            id: session.id.to_string(),
            user_id: session.user_id.to_string(),
            expires_at: session.expires_at,
            created_at: session.created_at,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
        }
    }
}
