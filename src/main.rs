use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod cli;
mod config;
mod errors;
mod models;
mod store;
mod tokens;

use auth::{PresenceValidator, SessionValidator};
use store::postgres::PgStore;

/// Shared application state passed to handlers and extractors.
pub struct AppState {
    pub db: PgStore,
    pub sessions: Box<dyn SessionValidator>,
    pub config: config::Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "noteboard=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Token { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            handle_token_command(&db, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let state = Arc::new(AppState {
        db,
        sessions: Box::new(PresenceValidator),
        config: cfg,
    });

    let app = axum::Router::new()
        // Health endpoints (no auth)
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .route("/readyz", axum::routing::get(readiness_check))
        // Token and notification API — nested under /api
        .nest("/api", api::api_router())
        .with_state(state.clone())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer({
            use axum::http::{HeaderName, Method};
            use tower_http::cors::AllowOrigin;
            let dashboard_origin = state.config.dashboard_origin.clone();
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str == dashboard_origin
                        || origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("x-api-token"),
                ])
                .allow_credentials(true)
        })
        .layer(axum::middleware::from_fn(security_headers_middleware));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Noteboard API listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn readiness_check() -> &'static str {
    "ok"
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    // Token responses must never be cached or leak via Referer.
    headers.insert("Cache-Control", "no-store".parse().unwrap());
    headers.insert("Referrer-Policy", "no-referrer".parse().unwrap());

    resp
}

async fn handle_token_command(db: &PgStore, cmd: cli::TokenCommands) -> anyhow::Result<()> {
    match cmd {
        cli::TokenCommands::Create { name } => {
            let name = tokens::validate_name(&name)
                .map_err(|_| anyhow::anyhow!("token name must be at least 3 characters"))?;
            let secret = tokens::generate_secret();
            let row = db.insert_token(name, &secret).await?;

            if let Err(e) = db
                .create_notification(
                    &format!("API token created: {}", row.name),
                    models::notification::CATEGORY_TOKEN_CREATED,
                    "Token Created",
                )
                .await
            {
                tracing::warn!("notification insert failed: {}", e);
            }

            println!(
                "Token created:\n  ID:    {}\n  Name:  {}\n  Use:   X-API-Token: {}",
                row.id, row.name, row.token
            );
            println!("Store it securely - you won't be able to see it again!");
        }
        cli::TokenCommands::List => {
            let rows = db.list_tokens().await?;
            if rows.is_empty() {
                println!("No tokens found.");
            } else {
                println!(
                    "{:<6} {:<20} {:<12} {:<22} {:<22} REVOKED",
                    "ID", "NAME", "TOKEN", "CREATED", "LAST USED"
                );
                for t in rows {
                    println!(
                        "{:<6} {:<20} {:<12} {:<22} {:<22} {}",
                        t.id,
                        t.name,
                        tokens::mask_secret(&t.token),
                        t.created_at.format("%Y-%m-%d %H:%M:%S"),
                        t.last_used
                            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_else(|| "-".into()),
                        t.revoked
                    );
                }
            }
        }
        cli::TokenCommands::Revoke { id } => {
            let existing = db.get_token(id).await?;
            match existing {
                Some(row) => {
                    db.revoke_token(id).await?;
                    if let Err(e) = db
                        .create_notification(
                            &format!("API token revoked: {}", row.name),
                            models::notification::CATEGORY_TOKEN_REVOKED,
                            "Token Revoked",
                        )
                        .await
                    {
                        tracing::warn!("notification insert failed: {}", e);
                    }
                    println!("Token revoked.");
                }
                None => println!("Token not found."),
            }
        }
    }
    Ok(())
}
