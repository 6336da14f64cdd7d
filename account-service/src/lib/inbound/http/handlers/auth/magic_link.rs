use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use super::found;
use super::session_cookie;
use super::StatusResponse;
use super::INVALID_TOKEN;
use super::NEW_USER_SIGNUP_DISABLED;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthProvider;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::client_info;

#[derive(Debug, Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: Option<String>,
}

pub async fn send_magic_link(
    State(state): State<AppState>,
    payload: Result<Json<MagicLinkRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    let email = EmailAddress::new(req.email).map_err(AuthError::from)?;

    state
        .auth_provider
        .send_magic_link(&email, req.callback_url.as_deref())
        .await?;

    Ok(Json(StatusResponse::ok()))
}

#[derive(Debug, Deserialize)]
pub struct VerifyMagicLinkQuery {
    pub token: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: Option<String>,
}

/// Signs the link owner in and redirects to the callback.
pub async fn verify_magic_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<VerifyMagicLinkQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let callback = query.callback_url.as_deref();

    match state
        .auth_provider
        .verify_magic_link(&query.token, client_info(&headers))
        .await
    {
        Ok(issued) => found(
            &state.redirects.resolve(callback),
            Some(session_cookie(&state, &issued.token)?),
        ),
        Err(AuthError::InvalidToken) => found(
            &state.redirects.resolve_with(callback, "error", INVALID_TOKEN),
            None,
        ),
        Err(AuthError::SignUpDisabled) => found(
            &state
                .redirects
                .resolve_with(callback, "error", NEW_USER_SIGNUP_DISABLED),
            None,
        ),
        Err(e) => Err(e.into()),
    }
}
