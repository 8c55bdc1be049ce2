//! Integration tests for the credential verifier and token lifecycle.
//!
//! These tests verify:
//! 1. Session precedence and token verification through the `TokenLookup` seam
//! 2. The full lifecycle scenario: issue → use → revoke → denied
//! 3. Fail-closed behavior when the store errors
//! 4. Error-to-response mapping (status codes and the fixed 401 body)
//!
//! The store is an in-memory stand-in implementing the same contract the
//! Postgres store does; DB-backed paths share the exact same verifier code.

use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, Utc};

use noteboard::auth::{
    self, AuthMethod, PresenceValidator, TokenIdentity, TokenLookup,
};
use noteboard::errors::{AppError, UNAUTHORIZED_MESSAGE};
use noteboard::tokens;

// ── In-memory token store ─────────────────────────────────────

#[derive(Clone)]
struct Row {
    id: i64,
    secret: String,
    name: String,
    last_used: Option<DateTime<Utc>>,
    revoked: bool,
}

#[derive(Default)]
struct MemStore {
    rows: Mutex<Vec<Row>>,
    fail: bool,
}

impl MemStore {
    fn issue(&self, name: &str) -> (i64, String) {
        let secret = tokens::generate_secret();
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(Row {
            id,
            secret: secret.clone(),
            name: name.to_string(),
            last_used: None,
            revoked: false,
        });
        (id, secret)
    }

    fn revoke(&self, id: i64) -> bool {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.revoked = true;
                true
            }
            None => false,
        }
    }

    fn row(&self, id: i64) -> Option<Row> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait]
impl TokenLookup for MemStore {
    async fn find_active_token(&self, secret: &str) -> anyhow::Result<Option<TokenIdentity>> {
        if self.fail {
            anyhow::bail!("database unreachable");
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.secret == secret && !r.revoked)
            .map(|r| TokenIdentity {
                id: r.id,
                name: r.name.clone(),
                secret: r.secret.clone(),
            }))
    }

    async fn touch_last_used(&self, secret: &str) -> anyhow::Result<()> {
        if let Some(row) = self
            .rows
            .lock()
            .unwrap()
            .iter_mut()
            .find(|r| r.secret == secret)
        {
            row.last_used = Some(Utc::now());
        }
        Ok(())
    }
}

fn header(name: &str, value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(
        HeaderName::try_from(name).unwrap(),
        HeaderValue::from_str(value).unwrap(),
    );
    map
}

// ── Verifier contract ─────────────────────────────────────────

mod verifier_tests {
    use super::*;

    #[tokio::test]
    async fn session_wins_even_with_valid_token_header() {
        let store = MemStore::default();
        let (_, secret) = store.issue("ci");

        let mut headers = header("cookie", "session=logged-in");
        headers.insert("x-api-token", HeaderValue::from_str(&secret).unwrap());

        let ctx = auth::verify(&headers, &PresenceValidator, &store)
            .await
            .unwrap();
        assert_eq!(ctx.method, AuthMethod::Session);
    }

    #[tokio::test]
    async fn issued_token_round_trips() {
        let store = MemStore::default();
        let (id, secret) = store.issue("Postman");

        let headers = header("x-api-token", &secret);
        let ctx = auth::verify(&headers, &PresenceValidator, &store)
            .await
            .unwrap();

        assert_eq!(ctx.method, AuthMethod::Token);
        assert_eq!(ctx.token_id, Some(id));
        assert_eq!(ctx.token_name.as_deref(), Some("Postman"));
    }

    #[tokio::test]
    async fn unknown_secret_is_denied() {
        let store = MemStore::default();
        store.issue("ci");

        let headers = header("x-api-token", &tokens::generate_secret());
        assert!(auth::verify(&headers, &PresenceValidator, &store)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn store_error_fails_closed() {
        let store = MemStore {
            fail: true,
            ..Default::default()
        };
        let headers = header("x-api-token", "anything");
        assert!(auth::verify(&headers, &PresenceValidator, &store)
            .await
            .is_none());
    }
}

// ── Lifecycle scenario ────────────────────────────────────────

mod lifecycle_tests {
    use super::*;

    /// issue "CI" → unused → verify → last_used set → revoke → denied,
    /// and revocation stays terminal across repeated calls.
    #[tokio::test]
    async fn issue_use_revoke_scenario() {
        let store = MemStore::default();
        let (id, secret) = store.issue("CI");

        let row = store.row(id).unwrap();
        assert!(!row.revoked);
        assert!(row.last_used.is_none());

        let headers = header("x-api-token", &secret);
        assert!(auth::verify(&headers, &PresenceValidator, &store)
            .await
            .is_some());
        assert!(store.row(id).unwrap().last_used.is_some());

        assert!(store.revoke(id));
        assert!(store.row(id).unwrap().revoked);
        assert!(auth::verify(&headers, &PresenceValidator, &store)
            .await
            .is_none());

        // Idempotent: revoking again succeeds and changes nothing.
        assert!(store.revoke(id));
        assert!(auth::verify(&headers, &PresenceValidator, &store)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn two_issuances_never_collide() {
        let store = MemStore::default();
        let (_, a) = store.issue("first");
        let (_, b) = store.issue("second");
        assert_ne!(a, b);
    }
}

// ── Error mapping ─────────────────────────────────────────────

mod error_tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unauthenticated_maps_to_fixed_401() {
        let resp = AppError::Unauthenticated.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], UNAUTHORIZED_MESSAGE);
    }

    #[tokio::test]
    async fn invalid_name_maps_to_400() {
        let resp = AppError::InvalidName.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(body["message"], "Token name must be at least 3 characters");
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let resp = AppError::TokenNotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_errors_map_to_generic_500() {
        let resp = AppError::Internal(anyhow::anyhow!("pool exhausted: 5 connections"))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // The underlying detail must not leak into the body.
        let body = body_json(resp).await;
        assert_eq!(body["message"], "internal server error");
    }
}
