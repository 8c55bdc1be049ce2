//! Noteboard auth core — library crate for integration testing.
//!
//! Re-exports modules needed by integration tests in `tests/`.

pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod tokens;
