use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::SessionData;
use crate::inbound::http::handlers::UserData;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::SessionResolver;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetSessionResponse {
    pub session: SessionData,
    pub user: UserData,
}

/// Current session, or JSON `null` when there is none.
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<GetSessionResponse>>, ApiError> {
    let auth_session = SessionResolver::new(state.auth_provider.as_ref(), state.cookie.name())
        .resolve(&headers)
        .await?;

    Ok(Json(auth_session.map(|auth_session| GetSessionResponse {
        session: auth_session.session.into(),
        user: auth_session.user.into(),
    })))
}
