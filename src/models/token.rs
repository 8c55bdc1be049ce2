use chrono::{DateTime, Utc};
use serde::Serialize;

/// Listing entry for an API token. `token` holds the masked form only —
/// the full secret leaves the service once, in the issuance response.
#[derive(Debug, Serialize)]
pub struct TokenMetadata {
    pub id: i64,
    pub token: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub revoked: bool,
}
