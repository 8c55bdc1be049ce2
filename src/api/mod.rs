use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    routing::{delete, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::{self, AuthContext};
use crate::errors::AppError;
use crate::AppState;

pub mod handlers;

/// Build the API router. All routes are relative — the caller mounts this
/// under `/api`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/tokens",
            get(handlers::list_tokens).post(handlers::issue_token),
        )
        .route("/tokens/:id", delete(handlers::revoke_token))
        .route("/notifications", get(handlers::list_notifications))
        .layer(TraceLayer::new_for_http())
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Extractor gating every protected handler. Runs the credential verifier
/// and rejects with the fixed 401 body before the handler touches anything.
pub struct RequireAuth(pub AuthContext);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match auth::verify(&parts.headers, state.sessions.as_ref(), &state.db).await {
            Some(ctx) => Ok(RequireAuth(ctx)),
            None => Err(AppError::Unauthenticated),
        }
    }
}
