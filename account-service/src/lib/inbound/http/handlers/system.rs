use std::any::Any;

use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::inbound::http::handlers::ApiError;

pub async fn home() -> Json<Value> {
    Json(json!({ "message": "Welcome to the API" }))
}

pub async fn health() -> &'static str {
    "OK"
}

/// Fallback for unmatched routes
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound {
        message: format!("Not Found - [{method}]:[{uri}]"),
        error: None,
    }
}

#[derive(Debug, Serialize)]
struct PanicBody {
    success: bool,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

/// 500 response for a handler panic; the panic detail is only exposed
/// outside production.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>, production: bool) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "Handler panicked");

    let body = PanicBody {
        success: false,
        message: "Internal Server Error",
        stack: (!production).then_some(detail),
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
