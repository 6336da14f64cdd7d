//! Better-auth compatible credential routes mounted under `/api/auth`.

pub mod get_session;
pub mod magic_link;
pub mod password;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod token;
pub mod verify_email;

pub use get_session::get_session;
pub use magic_link::send_magic_link;
pub use magic_link::verify_magic_link;
pub use password::change_password;
pub use password::forget_password;
pub use password::reset_password;
pub use password::reset_password_callback;
pub use sign_in::sign_in_email;
pub use sign_out::sign_out;
pub use sign_up::sign_up_email;
pub use token::token;
pub use verify_email::verify_email;

use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use url::Url;

use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// `{status: true}` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub status: bool,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: true }
    }
}

/// Error code appended to redirects for unusable tokens
pub(crate) const INVALID_TOKEN: &str = "INVALID_TOKEN";

/// Error code for magic links that would register a user while sign-up is off
pub(crate) const NEW_USER_SIGNUP_DISABLED: &str = "new_user_signup_disabled";

pub(crate) fn session_cookie(state: &AppState, token: &str) -> Result<HeaderValue, ApiError> {
    state
        .cookie
        .issue(token)
        .map_err(|e| ApiError::InternalServerError(e.to_string()))
}

pub(crate) fn cleared_cookie(state: &AppState) -> Result<HeaderValue, ApiError> {
    state
        .cookie
        .clear()
        .map_err(|e| ApiError::InternalServerError(e.to_string()))
}

/// 302 to `location`, optionally setting a cookie on the way.
pub(crate) fn found(location: &Url, cookie: Option<HeaderValue>) -> Result<Response, ApiError> {
    let location = HeaderValue::from_str(location.as_str())
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    let mut response = (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Attach a `Set-Cookie` header to an already built response.
pub(crate) fn with_cookie(mut response: Response, cookie: HeaderValue) -> Response {
    response.headers_mut().append(header::SET_COOKIE, cookie);
    response
}
