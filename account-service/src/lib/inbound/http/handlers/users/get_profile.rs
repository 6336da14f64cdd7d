use axum::extract::State;
use axum::http::StatusCode;

use super::profile_error;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::UserData;
use crate::inbound::http::middleware::AuthContext;
use crate::inbound::http::router::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    context: AuthContext,
) -> Result<ApiSuccess<UserData>, ApiError> {
    state
        .user_service
        .get_user(&context.user.id)
        .await
        .map_err(profile_error)
        .map(|user| ApiSuccess::new(StatusCode::OK, user.into()))
}
