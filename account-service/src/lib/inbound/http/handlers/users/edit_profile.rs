use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::profile_error;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiMessage;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::UserData;
use crate::inbound::http::middleware::AuthContext;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

/// HTTP request body for a profile update (raw JSON)
#[derive(Debug, Default, Deserialize)]
pub struct EditProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
}

impl EditProfileRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, UserError> {
        UpdateProfileCommand::new(self.name, self.phone, self.image)
    }
}

/// A missing or unreadable body counts as an empty update.
pub async fn edit_profile(
    State(state): State<AppState>,
    context: AuthContext,
    body: Option<Json<EditProfileRequest>>,
) -> Result<ApiSuccess<ApiMessage<UserData>>, ApiError> {
    let command = body
        .map(|Json(req)| req)
        .unwrap_or_default()
        .try_into_command()?;

    state
        .user_service
        .update_profile(&context.user.id, command)
        .await
        .map_err(profile_error)
        .map(|user| {
            ApiSuccess::new(
                StatusCode::OK,
                ApiMessage::new("Profile updated successfully", user.into()),
            )
        })
}
