use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::found;
use super::INVALID_TOKEN;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthProvider;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::UserData;
use crate::inbound::http::router::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyEmailResponse {
    pub status: bool,
    pub user: UserData,
}

/// Redirects when a callback is given, answers with JSON otherwise.
pub async fn verify_email(
    State(state): State<AppState>,
    query: Result<Query<VerifyEmailQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let callback = query.callback_url.as_deref();

    match (state.auth_provider.verify_email(&query.token).await, callback) {
        (Ok(_), Some(_)) => found(&state.redirects.resolve(callback), None),
        (Ok(user), None) => Ok(Json(VerifyEmailResponse {
            status: true,
            user: user.into(),
        })
        .into_response()),
        (Err(AuthError::InvalidToken), Some(_)) => found(
            &state.redirects.resolve_with(callback, "error", INVALID_TOKEN),
            None,
        ),
        (Err(e), _) => Err(e.into()),
    }
}
