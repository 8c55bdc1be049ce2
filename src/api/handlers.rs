use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::RequireAuth;
use crate::errors::AppError;
use crate::models::notification::{CATEGORY_TOKEN_CREATED, CATEGORY_TOKEN_REVOKED};
use crate::models::token::TokenMetadata;
use crate::tokens;
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct IssueTokenRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct NotificationParams {
    /// Category filter; absent or "*" means all.
    pub filter: Option<String>,
    pub limit: Option<i64>,
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/tokens — list all tokens, newest first, secrets masked
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    RequireAuth(_auth): RequireAuth,
) -> Result<Json<Value>, AppError> {
    let rows = state.db.list_tokens().await?;

    let tokens: Vec<TokenMetadata> = rows
        .into_iter()
        .map(|r| TokenMetadata {
            id: r.id,
            token: tokens::mask_secret(&r.token),
            name: r.name,
            created_at: r.created_at,
            last_used: r.last_used,
            revoked: r.revoked,
        })
        .collect();

    Ok(Json(json!({ "success": true, "tokens": tokens })))
}

/// POST /api/tokens — issue a new token. The only response that ever
/// carries the full secret.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Json(payload): Json<IssueTokenRequest>,
) -> Result<Json<Value>, AppError> {
    let name = tokens::validate_name(&payload.name)?;
    let secret = tokens::generate_secret();

    let row = state.db.insert_token(name, &secret).await?;

    // Fire-and-forget audit trail; a failed insert never fails issuance.
    if let Err(e) = state
        .db
        .create_notification(
            &format!("API token created: {}", row.name),
            CATEGORY_TOKEN_CREATED,
            "Token Created",
        )
        .await
    {
        tracing::warn!("notification insert failed: {}", e);
    }

    tracing::info!(method = ?auth.method, "issued API token '{}' (id {})", row.name, row.id);

    Ok(Json(json!({
        "success": true,
        "token": row.token,
        "name": row.name,
        "id": row.id,
        "created_at": row.created_at,
        "message": "Token created successfully. Use this token in the X-API-Token header. Store it securely - you won't be able to see it again!"
    })))
}

/// DELETE /api/tokens/:id — revoke a token (soft-delete, idempotent)
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let existing = state
        .db
        .get_token(id)
        .await?
        .ok_or(AppError::TokenNotFound)?;

    state.db.revoke_token(id).await?;

    if let Err(e) = state
        .db
        .create_notification(
            &format!("API token revoked: {}", existing.name),
            CATEGORY_TOKEN_REVOKED,
            "Token Revoked",
        )
        .await
    {
        tracing::warn!("notification insert failed: {}", e);
    }

    tracing::info!(method = ?auth.method, "revoked API token '{}' (id {})", existing.name, id);

    Ok(Json(json!({
        "success": true,
        "message": "Token revoked successfully"
    })))
}

/// GET /api/notifications — audit trail, newest first
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    RequireAuth(_auth): RequireAuth,
    Query(params): Query<NotificationParams>,
) -> Result<Json<Value>, AppError> {
    let category = params.filter.as_deref().filter(|f| *f != "*");
    let limit = params.limit.unwrap_or(40).clamp(1, 200);

    let notifications = state.db.list_notifications(category, limit).await?;

    Ok(Json(json!({ "success": true, "notifications": notifications })))
}
