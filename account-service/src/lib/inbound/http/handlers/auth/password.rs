use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::found;
use super::StatusResponse;
use super::INVALID_TOKEN;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthProvider;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::UserData;
use crate::inbound::http::middleware::AuthContext;
use crate::inbound::http::router::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgetPasswordRequest {
    pub email: String,
    pub redirect_to: Option<String>,
}

/// Always acknowledges, whether or not the address is registered.
pub async fn forget_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgetPasswordRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    let email = EmailAddress::new(req.email).map_err(AuthError::from)?;

    state
        .auth_provider
        .request_password_reset(&email, req.redirect_to.as_deref())
        .await?;

    Ok(Json(StatusResponse::ok()))
}

#[derive(Debug, Deserialize)]
pub struct ResetCallbackQuery {
    #[serde(rename = "callbackURL")]
    pub callback_url: Option<String>,
}

/// Landing point of the emailed reset link; hands the token to the front end.
pub async fn reset_password_callback(
    State(state): State<AppState>,
    Path(token): Path<String>,
    query: Result<Query<ResetCallbackQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let callback = query.callback_url.as_deref();

    let location = if state.auth_provider.check_reset_token(&token).await? {
        state.redirects.resolve_with(callback, "token", &token)
    } else {
        state
            .redirects
            .resolve_with(callback, "error", INVALID_TOKEN)
    };

    found(&location, None)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
    pub token: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    state
        .auth_provider
        .reset_password(&req.token, &req.new_password)
        .await?;

    Ok(Json(StatusResponse::ok()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    #[serde(default)]
    pub revoke_other_sessions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangePasswordResponse {
    pub token: Option<String>,
    pub user: UserData,
}

pub async fn change_password(
    State(state): State<AppState>,
    context: AuthContext,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<ChangePasswordResponse>, ApiError> {
    let Json(req) = payload?;
    let user = state
        .auth_provider
        .change_password(
            &context.into(),
            &req.current_password,
            &req.new_password,
            req.revoke_other_sessions,
        )
        .await?;

    Ok(Json(ChangePasswordResponse {
        token: None,
        user: user.into(),
    }))
}
