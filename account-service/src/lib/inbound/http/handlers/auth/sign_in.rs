use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::session_cookie;
use super::with_cookie;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthProvider;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::UserData;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::client_info;

/// HTTP request body for email sign-in (raw JSON)
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInResponse {
    pub redirect: bool,
    pub token: String,
    pub user: UserData,
}

pub async fn sign_in_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    // a malformed address can never match, so it fails like any other mismatch
    let email = EmailAddress::new(req.email).map_err(|_| AuthError::InvalidCredentials)?;

    let user = state
        .auth_provider
        .verify_credential(&email, &req.password)
        .await?;
    let issued = state
        .auth_provider
        .issue_session(user, client_info(&headers))
        .await?;

    let cookie = session_cookie(&state, &issued.token)?;
    let response = Json(SignInResponse {
        redirect: false,
        token: issued.token,
        user: issued.user.into(),
    })
    .into_response();

    Ok(with_cookie(response, cookie))
}
