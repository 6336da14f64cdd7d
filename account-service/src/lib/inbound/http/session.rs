use axum::http::header;
use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use url::Url;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::ClientInfo;
use crate::domain::auth::ports::AuthProvider;

/// Turns request headers into the session they carry.
///
/// The session cookie wins over an `Authorization: Bearer` header. Nothing is
/// cached; every call goes to the provider.
pub struct SessionResolver<'a> {
    provider: &'a dyn AuthProvider,
    cookie_name: &'a str,
}

impl<'a> SessionResolver<'a> {
    pub fn new(provider: &'a dyn AuthProvider, cookie_name: &'a str) -> Self {
        Self {
            provider,
            cookie_name,
        }
    }

    /// # Returns
    /// The live session, None when no usable token is present
    ///
    /// # Errors
    /// * `AuthError` - The session store could not be queried
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Option<AuthSession>, AuthError> {
        match session_token(headers, self.cookie_name) {
            Some(token) => self.provider.resolve_session(&token).await,
            None => Ok(None),
        }
    }
}

/// Raw session token from the cookie, falling back to a bearer header.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| auth::SessionCookie::find(value, cookie_name));
    if let Some(token) = from_cookie {
        return Some(token.to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Client address and agent, as far as the proxy headers tell.
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    let ip_address = header_text(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .or_else(|| header_text(headers, "x-real-ip"))
        .map(str::to_string);

    ClientInfo {
        ip_address,
        user_agent: header_text(headers, header::USER_AGENT.as_str()).map(str::to_string),
    }
}

fn header_text<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Session cookie as `Set-Cookie` header values.
#[derive(Debug, Clone)]
pub struct CookieWriter(auth::SessionCookie);

impl CookieWriter {
    pub fn new(cookie: auth::SessionCookie) -> Self {
        Self(cookie)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn issue(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.0.issue(token))
    }

    pub fn clear(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.0.clear())
    }
}

/// Keeps post-auth redirects on the front end.
///
/// Relative paths are resolved against the app URL; absolute URLs must share
/// its origin; anything else is replaced by the app URL itself.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    app_url: Url,
}

impl RedirectPolicy {
    pub fn new(app_url: Url) -> Self {
        Self { app_url }
    }

    pub fn app_url(&self) -> &Url {
        &self.app_url
    }

    pub fn resolve(&self, target: Option<&str>) -> Url {
        let Some(target) = target.map(str::trim).filter(|target| !target.is_empty()) else {
            return self.app_url.clone();
        };

        if target.starts_with('/') && !target.starts_with("//") {
            return self
                .app_url
                .join(target)
                .unwrap_or_else(|_| self.app_url.clone());
        }

        match Url::parse(target) {
            Ok(url) if url.origin() == self.app_url.origin() => url,
            _ => {
                tracing::warn!(target, "Untrusted redirect target replaced");
                self.app_url.clone()
            }
        }
    }

    /// `resolve` plus one extra query pair.
    pub fn resolve_with(&self, target: Option<&str>, key: &str, value: &str) -> Url {
        let mut url = self.resolve(target);
        url.query_pairs_mut().append_pair(key, value);
        url
    }
}
