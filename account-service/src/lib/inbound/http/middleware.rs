use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::Session;
use crate::domain::user::models::User;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::SessionResolver;

/// Per-request authentication state stored in request extensions.
///
/// Routes behind [`require_session`] or [`require_admin`] always see both
/// fields populated.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<User>,
    pub session: Option<Session>,
}

impl From<AuthSession> for RequestContext {
    fn from(auth_session: AuthSession) -> Self {
        Self {
            user: Some(auth_session.user),
            session: Some(auth_session.session),
        }
    }
}

/// Extractor for handlers that need the signed-in user.
///
/// Rejects with 401 when the request context carries no session.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub session: Session,
}

impl From<AuthContext> for AuthSession {
    fn from(context: AuthContext) -> Self {
        AuthSession {
            user: context.user,
            session: context.session,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();

        match (context.user, context.session) {
            (Some(user), Some(session)) => Ok(AuthContext { user, session }),
            _ => Err(ApiError::no_session()),
        }
    }
}

/// Middleware admitting only requests with a live session
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_session = resolve(&state, req.headers())
        .await?
        .ok_or_else(ApiError::no_session)?;

    req.extensions_mut()
        .insert(RequestContext::from(auth_session));

    Ok(next.run(req).await)
}

/// Middleware admitting only sessions whose user carries the admin flag
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_session = resolve(&state, req.headers())
        .await?
        .ok_or_else(ApiError::no_session)?;

    if !auth_session.user.is_admin {
        tracing::warn!(user_id = %auth_session.user.id, "Admin route refused");
        return Err(ApiError::not_admin());
    }

    req.extensions_mut()
        .insert(RequestContext::from(auth_session));

    Ok(next.run(req).await)
}

async fn resolve(state: &AppState, headers: &HeaderMap) -> Result<Option<AuthSession>, ApiError> {
    SessionResolver::new(state.auth_provider.as_ref(), state.cookie.name())
        .resolve(headers)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Session lookup failed");
            ApiError::from(e)
        })
}
