use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use url::Url;

use super::handlers::auth as auth_handlers;
use super::handlers::system::health;
use super::handlers::system::home;
use super::handlers::system::not_found;
use super::handlers::system::panic_response;
use super::handlers::users;
use super::handlers::well_known::jwks;
use super::handlers::well_known::openid_configuration;
use super::middleware::require_admin;
use super::middleware::require_session;
use super::session::CookieWriter;
use super::session::RedirectPolicy;
use crate::domain::auth::ports::AuthProvider;
use crate::domain::user::ports::UserServicePort;

const HEALTH_PATH: &str = "/health";

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub auth_provider: Arc<dyn AuthProvider>,
    pub cookie: CookieWriter,
    pub redirects: RedirectPolicy,
    /// Public origin of this service, used as the OIDC issuer
    pub public_url: String,
}

/// HTTP surface settings
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub public_url: String,
    pub app_url: Url,
    pub session_cookie: auth::SessionCookie,
    /// Origins allowed in addition to the app URL
    pub extra_origins: Vec<String>,
    pub production: bool,
}

pub fn create_router(
    user_service: Arc<dyn UserServicePort>,
    auth_provider: Arc<dyn AuthProvider>,
    config: RouterConfig,
) -> Router {
    let cors_layer = cors_layer(&config);
    let production = config.production;

    let state = AppState {
        user_service,
        auth_provider,
        cookie: CookieWriter::new(config.session_cookie),
        redirects: RedirectPolicy::new(config.app_url),
        public_url: config.public_url,
    };

    let public_auth_routes = Router::new()
        .route("/sign-up/email", post(auth_handlers::sign_up_email))
        .route("/sign-in/email", post(auth_handlers::sign_in_email))
        .route("/sign-out", post(auth_handlers::sign_out))
        .route("/get-session", get(auth_handlers::get_session))
        .route("/sign-in/magic-link", post(auth_handlers::send_magic_link))
        .route("/magic-link/verify", get(auth_handlers::verify_magic_link))
        .route("/forget-password", post(auth_handlers::forget_password))
        .route(
            "/reset-password/:token",
            get(auth_handlers::reset_password_callback),
        )
        .route("/reset-password", post(auth_handlers::reset_password))
        .route("/verify-email", get(auth_handlers::verify_email))
        .route("/jwks", get(jwks));

    let session_auth_routes = Router::new()
        .route("/change-password", post(auth_handlers::change_password))
        .route("/token", get(auth_handlers::token))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let session_user_routes = Router::new()
        .route(
            "/profile",
            get(users::get_profile).put(users::edit_profile),
        )
        .route("/:user_id", get(users::get_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let admin_user_routes = Router::new()
        .route("/", get(users::list_users))
        .route("/:user_id/role", patch(users::change_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            if request.uri().path() == HEALTH_PATH {
                return Span::none();
            }
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            if request.uri().path() == HEALTH_PATH {
                return;
            }
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
            // health checks run without a span
            if span.is_none() {
                return;
            }
            tracing::info!(
                status = response.status().as_u16(),
                latency_ms = latency.as_millis(),
                "Request completed"
            );
        });

    Router::new()
        .route("/", get(home))
        .route(HEALTH_PATH, get(health))
        .route("/.well-known/jwks.json", get(jwks))
        .route(
            "/.well-known/openid-configuration",
            get(openid_configuration),
        )
        .nest(
            "/api/auth",
            public_auth_routes.merge(session_auth_routes),
        )
        .nest(
            "/api/v1/users",
            session_user_routes.merge(admin_user_routes),
        )
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(move |payload| {
            panic_response(payload, production)
        }))
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .layer(cors_layer)
        .with_state(state)
}

fn cors_layer(config: &RouterConfig) -> CorsLayer {
    let app_origin = config.app_url.origin().ascii_serialization();
    let origins: Vec<HeaderValue> = std::iter::once(app_origin.as_str())
        .chain(config.extra_origins.iter().map(String::as_str))
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400))
}
