//! Credential verification for protected endpoints.
//!
//! Every protected route goes through [`verify`]: a session cookie wins
//! outright, otherwise the `X-API-Token` header is checked against the
//! persisted token set. A persistence error during lookup denies the
//! request — the gate fails closed rather than letting an error escape it.

use async_trait::async_trait;
use axum::http::{header::COOKIE, HeaderMap};
use serde::Serialize;
use subtle::ConstantTimeEq;

/// Cookie denoting an established browser session. Issuance and expiry
/// belong to the login flow; this gate never inspects the value itself.
pub const SESSION_COOKIE: &str = "session";

/// Header carrying the raw API token secret for non-browser clients.
pub const TOKEN_HEADER: &str = "x-api-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Session,
    Token,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub method: AuthMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,
}

impl AuthContext {
    pub fn session() -> Self {
        Self {
            method: AuthMethod::Session,
            token_id: None,
            token_name: None,
        }
    }

    pub fn token(id: i64, name: String) -> Self {
        Self {
            method: AuthMethod::Token,
            token_id: Some(id),
            token_name: Some(name),
        }
    }
}

/// What the verifier needs back from a token lookup.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    pub id: i64,
    pub name: String,
    /// Stored secret, re-compared in constant time against the presented one.
    pub secret: String,
}

/// Read side of the token store as seen by the verifier. Lookup is an
/// exact match filtered on `revoked = false`; `touch_last_used` records a
/// successful use and must never fail the enclosing verification.
#[async_trait]
pub trait TokenLookup: Send + Sync {
    async fn find_active_token(&self, secret: &str) -> anyhow::Result<Option<TokenIdentity>>;
    async fn touch_last_used(&self, secret: &str) -> anyhow::Result<()>;
}

/// Session validity as an injected capability. The default implementation
/// reproduces the presence-only check of the dashboard's login flow; a
/// signed-session validator can be dropped in without touching the gate.
pub trait SessionValidator: Send + Sync {
    fn is_valid(&self, cookie_value: &str) -> bool;
}

/// Accepts any non-empty `session` cookie.
pub struct PresenceValidator;

impl SessionValidator for PresenceValidator {
    fn is_valid(&self, cookie_value: &str) -> bool {
        !cookie_value.is_empty()
    }
}

/// Extract the session cookie value from the `Cookie` header, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Decide whether a request is authenticated, and by which method.
///
/// Order is strict: session first (a token header alongside a valid session
/// is ignored), then token lookup. Returns `None` when neither credential
/// is present or valid.
pub async fn verify(
    headers: &HeaderMap,
    sessions: &dyn SessionValidator,
    tokens: &dyn TokenLookup,
) -> Option<AuthContext> {
    if let Some(cookie) = session_cookie(headers) {
        if sessions.is_valid(&cookie) {
            return Some(AuthContext::session());
        }
    }

    let provided = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok())?;
    if provided.is_empty() {
        return None;
    }

    // Fail closed: a store error denies the request instead of propagating
    // past the gate.
    let identity = match tokens.find_active_token(provided).await {
        Ok(Some(identity)) => identity,
        Ok(None) => return None,
        Err(e) => {
            tracing::error!("token verification failed: {e}");
            return None;
        }
    };

    // The store already matched by equality; compare once more without
    // leaking timing on the secret bytes.
    if !bool::from(identity.secret.as_bytes().ct_eq(provided.as_bytes())) {
        return None;
    }

    // Best-effort usage tracking. Staleness of last_used is cosmetic.
    if let Err(e) = tokens.touch_last_used(provided).await {
        tracing::warn!("failed to update last_used for token {}: {e}", identity.id);
    }

    Some(AuthContext::token(identity.id, identity.name))
}
