use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use url::form_urlencoded;

pub const LOGIN_PATH: &str = "/auth/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

const PUBLIC_PATHS: [&str; 5] = [
    "/auth/login",
    "/auth/register",
    "/auth/forgot-password",
    "/auth/reset-password",
    "/",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Continue,
    Redirect(String),
}

/// Paths the guard runs on: the dashboard and the auth pages.
pub fn is_guarded(path: &str) -> bool {
    under(path, DASHBOARD_PATH) || under(path, "/auth")
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || path.starts_with("/auth/reset-password/")
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Login URL that brings the user back to `path` afterwards.
pub fn login_redirect(path: &str) -> String {
    let callback: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{LOGIN_PATH}?callbackUrl={callback}")
}

/// Decide from cookie presence alone. The cookie is never validated here.
pub fn decide(path: &str, has_session: bool) -> GuardDecision {
    if !is_guarded(path) {
        return GuardDecision::Continue;
    }

    match (is_public(path), has_session) {
        (true, true) => GuardDecision::Redirect(DASHBOARD_PATH.to_string()),
        (false, false) => GuardDecision::Redirect(login_redirect(path)),
        _ => GuardDecision::Continue,
    }
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    cookie_name: String,
}

impl RouteGuard {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    pub fn has_session(&self, request: &Request) -> bool {
        request
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| auth::SessionCookie::present(value, &self.cookie_name))
    }
}

pub async fn route_guard(
    State(guard): State<RouteGuard>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match decide(&path, guard.has_session(&request)) {
        GuardDecision::Continue => next.run(request).await,
        GuardDecision::Redirect(location) => {
            tracing::debug!(path = %path, location = %location, "Route guard redirect");
            Redirect::temporary(&location).into_response()
        }
    }
}
