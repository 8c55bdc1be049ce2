use clap::{Parser, Subcommand};

/// Noteboard — auth gate and API token service for the notes dashboard
#[derive(Parser)]
#[command(name = "noteboard", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Manage API tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Issue a new API token
    Create {
        #[arg(long)]
        name: String,
    },
    /// List tokens (secrets masked)
    List,
    /// Revoke a token by id
    Revoke {
        #[arg(long)]
        id: i64,
    },
}
