//! igarchive-core: social media export ingestion
//!
//! This crate opens a personal data export (a zip archive), decodes the
//! known JSON files inside it, and upserts normalized media and relationship
//! records into a per-user SQLite store. It also carries the configuration,
//! storage queries and access-token helpers shared by the CLI and the API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod schema;

pub use config::Config;
pub use db::Database;
pub use error::Error;
pub use error::Result;
pub use ingest::{IngestReport, extract_archive, ingest_archive, ingest_reader};

/// Application name used for config directories and paths.
pub const APP_NAME: &str = "igarchive";

/// Returns the environment variable prefix for this application.
pub fn env_prefix() -> String {
    "IGARCHIVE".to_string()
}
