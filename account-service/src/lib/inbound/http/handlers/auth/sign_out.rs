use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;

use super::cleared_cookie;
use super::with_cookie;
use crate::domain::auth::ports::AuthProvider;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::session_token;

/// Revokes the presented session and always clears the cookie.
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers, state.cookie.name()) {
        state.auth_provider.sign_out(&token).await?;
    }

    let response = Json(json!({ "success": true })).into_response();
    Ok(with_cookie(response, cleared_cookie(&state)?))
}
