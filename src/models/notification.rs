use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit-trail entry written by token issuance and revocation.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

pub const CATEGORY_TOKEN_CREATED: &str = "tokencreated";
pub const CATEGORY_TOKEN_REVOKED: &str = "tokenrevoked";
