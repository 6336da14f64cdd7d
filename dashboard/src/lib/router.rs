use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::guard::route_guard;
use crate::guard::RouteGuard;

/// Edge server: the route guard in front of the built front-end.
///
/// Unknown paths fall back to `index.html` so client-side routes load.
pub fn create_router(assets_dir: impl AsRef<Path>, cookie_name: &str) -> Router {
    let assets_dir = assets_dir.as_ref();
    let assets = ServeDir::new(assets_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(assets_dir.join("index.html")));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
            tracing::info!(
                status = response.status().as_u16(),
                latency_ms = latency.as_millis(),
                "Request completed"
            );
        });

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .fallback_service(assets)
        .layer(middleware::from_fn_with_state(
            RouteGuard::new(cookie_name),
            route_guard,
        ))
        .layer(trace_layer)
}
