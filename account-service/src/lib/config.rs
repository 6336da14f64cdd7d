use std::env;

use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use url::Url;

use crate::domain::auth::models::AuthSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Public URL of this service
    pub base_url: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub secret: String,
    /// Front-end origin, the only trusted redirect target
    pub app_url: String,
    #[serde(default = "default_cookie_prefix")]
    pub cookie_prefix: String,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_max_password_length")]
    pub max_password_length: usize,
    #[serde(default)]
    pub disable_sign_up: bool,
    #[serde(default = "default_true")]
    pub auto_sign_in: bool,
    #[serde(default = "default_true")]
    pub send_verification_on_sign_up: bool,
    #[serde(default = "default_session_expires_in")]
    pub session_expires_in_seconds: i64,
    #[serde(default = "default_magic_link_expires_in")]
    pub magic_link_expires_in_seconds: i64,
    #[serde(default = "default_one_hour")]
    pub reset_password_expires_in_seconds: i64,
    #[serde(default = "default_one_hour")]
    pub email_verification_expires_in_seconds: i64,
    #[serde(default = "default_jwt_expires_in")]
    pub jwt_expires_in_seconds: i64,
    /// How often expired sessions and verification tokens are deleted
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    /// Origins trusted in addition to `auth.app_url`
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_cookie_prefix() -> String {
    "better-auth".to_string()
}

fn default_min_password_length() -> usize {
    8
}

fn default_max_password_length() -> usize {
    128
}

fn default_true() -> bool {
    true
}

fn default_session_expires_in() -> i64 {
    60 * 60 * 24 * 7
}

fn default_magic_link_expires_in() -> i64 {
    300
}

fn default_one_hour() -> i64 {
    3600
}

fn default_jwt_expires_in() -> i64 {
    900
}

fn default_cleanup_interval() -> u64 {
    3600
}

/// Unprefixed variables such as `DATABASE__URL` or
/// `CORS__ALLOWED_ORIGINS=https://a.example,https://b.example`.
fn environment() -> Environment {
    Environment::default()
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("cors.allowed_origins")
        .try_parsing(true)
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, AUTH__SECRET, etc.)
    /// 2. Environment-specific config file (config/{RUN_MODE}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment())
            .build()?;

        configuration.try_deserialize()
    }

    /// Session cookies carry `Secure` when the service is served over https.
    pub fn secure_cookies(&self) -> bool {
        Url::parse(&self.app.base_url).is_ok_and(|url| url.scheme() == "https")
    }

    /// Public URL of the `/api/auth` surface
    pub fn auth_base_url(&self) -> String {
        format!("{}/api/auth", self.app.base_url.trim_end_matches('/'))
    }

    pub fn auth_settings(&self) -> AuthSettings {
        let auth = &self.auth;
        AuthSettings {
            base_url: self.auth_base_url(),
            password_policy: auth::PasswordPolicy::new(
                auth.min_password_length,
                auth.max_password_length,
            ),
            disable_sign_up: auth.disable_sign_up,
            auto_sign_in: auth.auto_sign_in,
            send_verification_on_sign_up: auth.send_verification_on_sign_up,
            session_expires_in: Duration::seconds(auth.session_expires_in_seconds),
            magic_link_expires_in: Duration::seconds(auth.magic_link_expires_in_seconds),
            reset_password_expires_in: Duration::seconds(auth.reset_password_expires_in_seconds),
            email_verification_expires_in: Duration::seconds(
                auth.email_verification_expires_in_seconds,
            ),
            jwt_expires_in: Duration::seconds(auth.jwt_expires_in_seconds),
        }
    }
}
