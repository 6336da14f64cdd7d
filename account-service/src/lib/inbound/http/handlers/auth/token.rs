use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::domain::auth::ports::AuthProvider;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::middleware::AuthContext;
use crate::inbound::http::router::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Short-lived JWT for the signed-in user
pub async fn token(
    State(state): State<AppState>,
    context: AuthContext,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.auth_provider.issue_token(&context.into())?;
    Ok(Json(TokenResponse { token }))
}
