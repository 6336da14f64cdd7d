pub mod change_role;
pub mod edit_profile;
pub mod get_profile;
pub mod get_user;
pub mod list_users;

pub use change_role::change_role;
pub use edit_profile::edit_profile;
pub use get_profile::get_profile;
pub use get_user::get_user;
pub use list_users::list_users;

use crate::inbound::http::handlers::ApiError;
use crate::user::errors::UserError;

/// Profile routes report a missing record differently from id lookups.
fn profile_error(err: UserError) -> ApiError {
    match err {
        UserError::NotFound(_) => ApiError::NotFound {
            message: "Profile not found".to_string(),
            error: Some("No profile found for the user".to_string()),
        },
        other => ApiError::from(other),
    }
}
