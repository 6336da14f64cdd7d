use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::inbound::http::router::AppState;

/// OpenID Connect discovery document.
///
/// Only what this service actually serves is advertised: no authorization,
/// token or userinfo endpoint is mounted, so none is listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenIdConfiguration {
    pub issuer: String,
    pub jwks_uri: String,
    pub scopes_supported: Vec<&'static str>,
    pub subject_types_supported: Vec<&'static str>,
    pub id_token_signing_alg_values_supported: Vec<&'static str>,
}

impl OpenIdConfiguration {
    pub fn for_issuer(issuer: &str) -> Self {
        let issuer = issuer.trim_end_matches('/');
        Self {
            issuer: issuer.to_string(),
            jwks_uri: format!("{issuer}/.well-known/jwks.json"),
            scopes_supported: vec!["openid", "profile", "email"],
            subject_types_supported: vec!["public"],
            id_token_signing_alg_values_supported: vec!["HS256"],
        }
    }
}

pub async fn openid_configuration(State(state): State<AppState>) -> Json<OpenIdConfiguration> {
    Json(OpenIdConfiguration::for_issuer(&state.public_url))
}

/// Serves both `/.well-known/jwks.json` and `/api/auth/jwks`
pub async fn jwks(State(state): State<AppState>) -> Json<Value> {
    Json(state.auth_provider.jwks())
}
