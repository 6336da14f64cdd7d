//! Form flows of the dashboard pages.
//!
//! Every form runs the same state machine: `Idle -> Submitting -> Success`,
//! or back to `Idle` with an error notification when the call fails. Local
//! validation runs first and a form that fails it never reaches the network.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::client::AuthApi;
use crate::client::ClientError;
use crate::client::ProfileUpdate;
use crate::guard::DASHBOARD_PATH;
use crate::guard::LOGIN_PATH;
use crate::toast::Toast;

pub const PROFILE_PATH: &str = "/dashboard/profile";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("valid email pattern")
});

static SIGN_UP_PASSWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\d@$!%*#?&]{8,}$").expect("valid password pattern"));

const SIGN_UP_SPECIALS: &str = "@$!%*#?&";
const STRONG_SPECIALS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
    Success(Outcome),
}

/// What a successful submission leads to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmation(Confirmation),
    Navigate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    MagicLinkSent,
    ResetLinkSent,
    PasswordReset,
}

impl Confirmation {
    /// Page to move on to once the confirmation has been shown.
    pub fn next(&self) -> Option<&'static str> {
        match self {
            Confirmation::PasswordReset => Some(LOGIN_PATH),
            Confirmation::MagicLinkSent | Confirmation::ResetLinkSent => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Values of one form together with how to validate and submit them.
#[async_trait]
pub trait FormFlow: Send + Sync {
    fn validate(&self) -> Vec<FieldError> {
        Vec::new()
    }

    async fn submit(&self, api: &dyn AuthApi) -> Result<Outcome, ClientError>;

    fn success_toast(&self) -> Toast;

    fn error_toast(&self, error: &ClientError) -> Toast;
}

pub struct Form<V> {
    values: V,
    state: FormState,
    field_errors: Vec<FieldError>,
    toasts: Vec<Toast>,
}

impl<V: FormFlow> Form<V> {
    pub fn new(values: V) -> Self {
        Self {
            values,
            state: FormState::Idle,
            field_errors: Vec::new(),
            toasts: Vec::new(),
        }
    }

    pub fn values(&self) -> &V {
        &self.values
    }

    /// Edit the values. Clears field errors from the previous attempt.
    pub fn edit(&mut self, change: impl FnOnce(&mut V)) {
        change(&mut self.values);
        self.field_errors.clear();
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    pub async fn submit(&mut self, api: &dyn AuthApi) -> &FormState {
        if self.state != FormState::Idle {
            return &self.state;
        }

        self.field_errors = self.values.validate();
        if !self.field_errors.is_empty() {
            return &self.state;
        }

        self.state = FormState::Submitting;
        match self.values.submit(api).await {
            Ok(outcome) => {
                self.toasts.push(self.values.success_toast());
                self.state = FormState::Success(outcome);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Form submission failed");
                self.toasts.push(self.values.error_toast(&e));
                self.state = FormState::Idle;
            }
        }
        &self.state
    }

    /// Leave a confirmation view and start over with the same values.
    pub fn reset(&mut self) {
        self.state = FormState::Idle;
    }
}

fn message_or(error: &ClientError, fallback: &str) -> String {
    match error {
        ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
        _ => fallback.to_string(),
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !EMAIL_RE.is_match(email) {
        errors.push(FieldError::new("email", "Invalid email address"));
    }
}

fn check_confirmation(password: &str, confirmation: &str, errors: &mut Vec<FieldError>) {
    if password != confirmation {
        errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
    }
}

/// Letter, digit and one of `@$!%*#?&`, at least 8 characters from that set.
fn check_sign_up_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    } else if password.chars().count() < 8 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 8 characters",
        ));
    } else if !SIGN_UP_PASSWORD_RE.is_match(password)
        || !password.chars().any(|c| c.is_ascii_alphabetic())
        || !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(|c| SIGN_UP_SPECIALS.contains(c))
    {
        errors.push(FieldError::new(
            "password",
            "Password must include at least one letter, one number, and one special character",
        ));
    }
}

/// Lowercase, uppercase, and a digit or symbol, at least 8 characters.
fn check_new_password(field: &'static str, password: &str, errors: &mut Vec<FieldError>) {
    if password.is_empty() {
        errors.push(FieldError::new(field, "New password is required"));
    } else if password.chars().count() < 8 {
        errors.push(FieldError::new(
            field,
            "Password must be at least 8 characters",
        ));
    } else if !password.chars().any(|c| c.is_ascii_lowercase())
        || !password.chars().any(|c| c.is_ascii_uppercase())
        || !password
            .chars()
            .any(|c| c.is_ascii_digit() || STRONG_SPECIALS.contains(c))
    {
        errors.push(FieldError::new(
            field,
            "Password must include at least one uppercase letter, one lowercase letter, and one number or special character",
        ));
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// `callbackUrl` of the login page
    pub callback_url: Option<String>,
}

#[async_trait]
impl FormFlow for LoginForm {
    async fn submit(&self, api: &dyn AuthApi) -> Result<Outcome, ClientError> {
        api.sign_in_email(&self.email, &self.password).await?;
        let target = self
            .callback_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DASHBOARD_PATH.to_string());
        Ok(Outcome::Navigate(target))
    }

    fn success_toast(&self) -> Toast {
        Toast::success("Welcome back!", "You have successfully logged in.")
    }

    fn error_toast(&self, _error: &ClientError) -> Toast {
        Toast::error(
            "Login failed",
            "Invalid email or password. Please try again.",
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct MagicLinkForm {
    pub email: String,
    /// Absolute URL the emailed link lands on
    pub callback_url: String,
}

#[async_trait]
impl FormFlow for MagicLinkForm {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        errors
    }

    async fn submit(&self, api: &dyn AuthApi) -> Result<Outcome, ClientError> {
        api.send_magic_link(&self.email, &self.callback_url).await?;
        Ok(Outcome::Confirmation(Confirmation::MagicLinkSent))
    }

    fn success_toast(&self) -> Toast {
        Toast::success("Magic link sent", "Check your email for a login link.")
    }

    fn error_toast(&self, error: &ClientError) -> Toast {
        Toast::error(
            "Failed to send magic link",
            message_or(error, "There was a problem sending the magic link"),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

#[async_trait]
impl FormFlow for RegisterForm {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().chars().count() < 2 {
            errors.push(FieldError::new(
                "name",
                "Name must be at least 2 characters",
            ));
        }
        check_email(&self.email, &mut errors);
        check_sign_up_password(&self.password, &mut errors);
        check_confirmation(&self.password, &self.confirm_password, &mut errors);
        if !self.accept_terms {
            errors.push(FieldError::new(
                "terms",
                "You must agree to the terms and conditions",
            ));
        }
        errors
    }

    async fn submit(&self, api: &dyn AuthApi) -> Result<Outcome, ClientError> {
        api.sign_up_email(self.name.trim(), &self.email, &self.password)
            .await?;
        Ok(Outcome::Navigate(DASHBOARD_PATH.to_string()))
    }

    fn success_toast(&self) -> Toast {
        Toast::success("Welcome!", "Your account has been created successfully.")
    }

    fn error_toast(&self, error: &ClientError) -> Toast {
        Toast::error(
            "Registration failed",
            message_or(error, "There was a problem creating your account"),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForgotPasswordForm {
    pub email: String,
    /// Absolute URL of the reset page
    pub redirect_to: String,
}

#[async_trait]
impl FormFlow for ForgotPasswordForm {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        errors
    }

    async fn submit(&self, api: &dyn AuthApi) -> Result<Outcome, ClientError> {
        api.forget_password(&self.email, &self.redirect_to).await?;
        Ok(Outcome::Confirmation(Confirmation::ResetLinkSent))
    }

    fn success_toast(&self) -> Toast {
        Toast::success("Reset link sent", "Check your email for reset instructions.")
    }

    fn error_toast(&self, error: &ClientError) -> Toast {
        Toast::error(
            "Failed to send reset link",
            message_or(error, "There was a problem sending the reset link"),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    /// `token` query parameter of the reset page
    pub token: Option<String>,
    pub new_password: String,
    pub confirm_password: String,
}

#[async_trait]
impl FormFlow for ResetPasswordForm {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.token.as_deref().map_or(true, str::is_empty) {
            errors.push(FieldError::new("token", "Invalid or missing reset token"));
        }
        check_new_password("newPassword", &self.new_password, &mut errors);
        check_confirmation(&self.new_password, &self.confirm_password, &mut errors);
        errors
    }

    async fn submit(&self, api: &dyn AuthApi) -> Result<Outcome, ClientError> {
        let token = self.token.as_deref().unwrap_or_default();
        api.reset_password(token, &self.new_password).await?;
        Ok(Outcome::Confirmation(Confirmation::PasswordReset))
    }

    fn success_toast(&self) -> Toast {
        Toast::success(
            "Password reset successful",
            "Your password has been reset. You can now log in with your new password.",
        )
    }

    fn error_toast(&self, _error: &ClientError) -> Toast {
        Toast::error(
            "Password reset failed",
            "There was a problem resetting your password. Please try again or request a new reset link.",
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[async_trait]
impl FormFlow for ChangePasswordForm {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.current_password.is_empty() {
            errors.push(FieldError::new(
                "currentPassword",
                "Current password is required",
            ));
        }
        check_new_password("newPassword", &self.new_password, &mut errors);
        check_confirmation(&self.new_password, &self.confirm_password, &mut errors);
        errors
    }

    async fn submit(&self, api: &dyn AuthApi) -> Result<Outcome, ClientError> {
        api.change_password(&self.current_password, &self.new_password)
            .await?;
        Ok(Outcome::Navigate(PROFILE_PATH.to_string()))
    }

    fn success_toast(&self) -> Toast {
        Toast::success(
            "Password updated",
            "Your password has been successfully changed.",
        )
    }

    fn error_toast(&self, _error: &ClientError) -> Toast {
        Toast::error(
            "Update failed",
            "There was a problem updating your password. Please try again.",
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditProfileForm {
    pub name: String,
    pub phone: String,
    pub image: String,
}

#[async_trait]
impl FormFlow for EditProfileForm {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().chars().count() < 2 {
            errors.push(FieldError::new(
                "name",
                "Name must be at least 2 characters",
            ));
        }
        errors
    }

    async fn submit(&self, api: &dyn AuthApi) -> Result<Outcome, ClientError> {
        let present = |value: &str| Some(value.trim().to_string()).filter(|v| !v.is_empty());
        let update = ProfileUpdate {
            name: present(&self.name),
            phone: present(&self.phone),
            image: present(&self.image),
        };
        api.update_profile(&update).await?;
        Ok(Outcome::Navigate(PROFILE_PATH.to_string()))
    }

    fn success_toast(&self) -> Toast {
        Toast::success("Profile updated", "Your profile has been successfully updated.")
    }

    fn error_toast(&self, _error: &ClientError) -> Toast {
        Toast::error(
            "Update failed",
            "There was a problem updating your profile. Please try again.",
        )
    }
}

/// The sign-out action of the dashboard layout
#[derive(Debug, Clone, Default)]
pub struct SignOut;

#[async_trait]
impl FormFlow for SignOut {
    async fn submit(&self, api: &dyn AuthApi) -> Result<Outcome, ClientError> {
        api.sign_out().await?;
        Ok(Outcome::Navigate(LOGIN_PATH.to_string()))
    }

    fn success_toast(&self) -> Toast {
        Toast::success(
            "Logged out successfully",
            "You have been successfully logged out.",
        )
    }

    fn error_toast(&self, error: &ClientError) -> Toast {
        Toast::error("Logout failed", message_or(error, "Please try again."))
    }
}
