//! igarchive CLI - social media export ingestion

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use igarchive_core::auth::TokenSigner;
use igarchive_core::models::{MediaKind, RelationKind};
use igarchive_core::{Config, Database};

mod ingest;
mod pretty;

#[derive(Debug, Parser)]
#[command(
    name = "igarchive",
    author,
    version,
    about = "Ingest personal social media exports into a queryable store",
    propagate_version = true
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print machine-readable JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest an export archive for a user
    Ingest {
        /// Path to the export zip
        archive: PathBuf,

        /// Owning user id
        #[arg(long)]
        user: i64,

        /// Also unpack the archive into the user's upload directory
        #[arg(long)]
        extract: bool,
    },

    /// Show row counts for a user
    Stats {
        /// User id
        #[arg(long)]
        user: i64,
    },

    /// List a user's media
    Media {
        /// User id
        #[arg(long)]
        user: i64,
    },

    /// List a user's connections
    Connections {
        /// User id
        #[arg(long)]
        user: i64,

        /// Only show one connection kind (e.g. follower, blocked)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Print a signed access token for a user
    Token {
        /// User id
        #[arg(long)]
        user: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config
    let config_path = cli.config.unwrap_or_else(Config::default_config_path);
    let config = Config::ensure_at(&config_path)?;

    // Open database
    let db = Database::open(&config.database).await?;

    let result = match cli.command {
        Command::Ingest {
            archive,
            user,
            extract,
        } => cmd_ingest(&db, &config, archive, user, extract, cli.json).await,
        Command::Stats { user } => cmd_stats(&db, user, cli.json).await,
        Command::Media { user } => cmd_media(&db, user, cli.json).await,
        Command::Connections { user, kind } => cmd_connections(&db, user, kind, cli.json).await,
        Command::Token { user } => cmd_token(&config, user, cli.json),
    };
    db.close().await;
    result
}

async fn cmd_ingest(
    db: &Database,
    config: &Config,
    archive: PathBuf,
    user_id: i64,
    extract: bool,
    json: bool,
) -> Result<()> {
    let outcome = ingest::ingest_file(db, config, &archive, user_id, extract).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        pretty::print_ingest_outcome(&outcome);
    }
    Ok(())
}

async fn cmd_stats(db: &Database, user_id: i64, json: bool) -> Result<()> {
    let mut stats = pretty::UserStats {
        user_id,
        ..Default::default()
    };
    for kind in [MediaKind::Post, MediaKind::Story] {
        stats.media.push((kind, db.count_media(user_id, Some(kind)).await?));
    }
    for kind in RelationKind::ALL {
        let count = if kind == RelationKind::FollowedHashtag {
            db.count_hashtags(user_id).await?
        } else {
            db.count_connections(user_id, Some(kind)).await?
        };
        stats.connections.push((kind, count));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        pretty::print_stats(&stats);
    }
    Ok(())
}

async fn cmd_media(db: &Database, user_id: i64, json: bool) -> Result<()> {
    let items = db.list_media(user_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        pretty::print_media(&items);
    }
    Ok(())
}

async fn cmd_connections(
    db: &Database,
    user_id: i64,
    kind: Option<String>,
    json: bool,
) -> Result<()> {
    let kind = kind.map(|k| k.parse::<RelationKind>()).transpose()?;
    let connections = db.list_connections(user_id, kind).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&connections)?);
    } else {
        pretty::print_connections(&connections);
    }
    Ok(())
}

fn cmd_token(config: &Config, user_id: i64, json: bool) -> Result<()> {
    let signer = TokenSigner::from_config(config)?;
    let token = signer.issue(user_id)?;
    if json {
        println!("{}", serde_json::json!({ "user_id": user_id, "token": token }));
    } else {
        println!("{token}");
    }
    Ok(())
}
