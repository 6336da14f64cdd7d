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
use crate::domain::auth::models::SignUpCommand;
use crate::domain::auth::ports::AuthProvider;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::UserData;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::client_info;

/// HTTP request body for email sign-up (raw JSON)
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub image: Option<String>,
}

impl SignUpRequest {
    fn try_into_command(self) -> Result<SignUpCommand, AuthError> {
        Ok(SignUpCommand {
            name: self.name.trim().to_string(),
            email: EmailAddress::new(self.email)?,
            password: self.password,
            phone: self.phone.filter(|phone| !phone.is_empty()),
            image: self.image.filter(|image| !image.is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpResponse {
    pub token: Option<String>,
    pub user: UserData,
}

pub async fn sign_up_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let command = req.try_into_command()?;

    let outcome = state
        .auth_provider
        .sign_up(command, client_info(&headers))
        .await?;

    let token = outcome.session.as_ref().map(|issued| issued.token.clone());
    let response = Json(SignUpResponse {
        token: token.clone(),
        user: outcome.user.into(),
    })
    .into_response();

    match token {
        Some(token) => Ok(with_cookie(response, session_cookie(&state, &token)?)),
        None => Ok(response),
    }
}
