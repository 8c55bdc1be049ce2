use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{TokenIdentity, TokenLookup};
use crate::models::notification::Notification;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // -- Token Operations --

    pub async fn insert_token(&self, name: &str, secret: &str) -> anyhow::Result<ApiTokenRow> {
        let row = sqlx::query_as::<_, ApiTokenRow>(
            r#"INSERT INTO api_tokens (token, name, created_at, last_used, revoked)
               VALUES ($1, $2, NOW(), NULL, FALSE)
               RETURNING id, token, name, created_at, last_used, revoked"#,
        )
        .bind(secret)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// All tokens, revoked ones included, newest first.
    pub async fn list_tokens(&self) -> anyhow::Result<Vec<ApiTokenRow>> {
        let rows = sqlx::query_as::<_, ApiTokenRow>(
            "SELECT id, token, name, created_at, last_used, revoked FROM api_tokens ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_token(&self, id: i64) -> anyhow::Result<Option<ApiTokenRow>> {
        let row = sqlx::query_as::<_, ApiTokenRow>(
            "SELECT id, token, name, created_at, last_used, revoked FROM api_tokens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Soft-delete: the row persists with `revoked = true`. Revoking an
    /// already-revoked token is a no-op success.
    pub async fn revoke_token(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE api_tokens SET revoked = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // -- Notification Operations --

    pub async fn create_notification(
        &self,
        title: &str,
        category: &str,
        label: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO notifications (title, category, label, created_at)
               VALUES ($1, $2, $3, NOW())"#,
        )
        .bind(title)
        .bind(category)
        .bind(label)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_notifications(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> anyhow::Result<Vec<Notification>> {
        let rows = match category {
            Some(category) => {
                sqlx::query_as::<_, Notification>(
                    r#"SELECT id, title, category, label, created_at
                       FROM notifications
                       WHERE category = $1
                       ORDER BY created_at DESC
                       LIMIT $2"#,
                )
                .bind(category)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Notification>(
                    r#"SELECT id, title, category, label, created_at
                       FROM notifications
                       ORDER BY created_at DESC
                       LIMIT $1"#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }
}

#[async_trait]
impl TokenLookup for PgStore {
    async fn find_active_token(&self, secret: &str) -> anyhow::Result<Option<TokenIdentity>> {
        let row = sqlx::query_as::<_, ApiTokenRow>(
            "SELECT id, token, name, created_at, last_used, revoked FROM api_tokens WHERE token = $1 AND revoked = FALSE"
        )
        .bind(secret)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| TokenIdentity {
            id: r.id,
            name: r.name,
            secret: r.token,
        }))
    }

    async fn touch_last_used(&self, secret: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE api_tokens SET last_used = NOW() WHERE token = $1")
            .bind(secret)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// -- Output structs --

#[derive(Debug, sqlx::FromRow, Serialize, Deserialize)]
pub struct ApiTokenRow {
    pub id: i64,
    /// Raw secret. Only the issuance response may carry it outward.
    pub token: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub revoked: bool,
}
