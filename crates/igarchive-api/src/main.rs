use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{HeaderValue, Method, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use igarchive_core::auth::TokenSigner;
use igarchive_core::models::{Connection, FollowedHashtag, MediaItem, RelationKind};
use igarchive_core::{Config, Database, extract_archive, ingest_archive};

mod auth;
mod error;

use auth::AuthUser;
use error::ApiError;

/// Multipart field carrying the uploaded export.
const UPLOAD_FIELD: &str = "archiveFile";

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn try_main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config_path = cli
        .common
        .config
        .unwrap_or_else(Config::default_config_path);
    let config = Config::ensure_at(&config_path)?;

    let db = Database::open(&config.database).await?;
    let signer = TokenSigner::from_config(&config)?;
    let port = cli.common.port.unwrap_or(config.api.port);

    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(db),
        signer: Arc::new(signer),
    };
    let app = build_router(state)?;

    let addr = SocketAddr::from((cli.common.host, port));
    info!("Starting API server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Parser)]
#[command(author, version, about = "HTTP API server for igarchive")]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// Port to listen on (defaults to api.port from the config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    db: Arc<Database>,
    signer: Arc<TokenSigner>,
}

fn build_router(state: AppState) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.api.allowed_origins)?)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/upload", post(upload))
        .route("/media", get(list_media))
        .route("/connections", get(list_connections))
        .route("/hashtags", get(list_hashtags))
        .route("/mediafile/{*path}", get(media_file))
        .layer(DefaultBodyLimit::max(state.config.api.max_upload_bytes));

    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn allowed_origins(origins: &[String]) -> Result<AllowOrigin> {
    if origins.iter().any(|origin| origin == "*") {
        return Ok(AllowOrigin::from(Any));
    }
    let values = origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AllowOrigin::list(values))
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;

        let dest = state.config.user_upload_dir(user_id);
        let staged = tokio::task::spawn_blocking(move || stage_and_extract(&data, &dest))
            .await
            .map_err(|e| ApiError::Internal(format!("Extraction task failed: {e}")))??;

        let report = ingest_archive(&state.db, staged.path(), user_id).await?;
        info!(
            "Ingested upload for user {user_id}: {} of {} entries recognized, {} records written",
            report.entries_recognized, report.entries_seen, report.facts_written
        );
        if !report.is_complete() {
            warn!(
                "Upload for user {user_id} was partially ingested: {} entries and {} records failed",
                report.entries_failed, report.facts_failed
            );
        }

        return Ok(Json(MessageResponse {
            message: "File uploaded, processed successfully.",
        }));
    }

    Err(ApiError::BadRequest(format!(
        "Invalid file key. Expected '{UPLOAD_FIELD}'."
    )))
}

/// Write the upload to a temp file inside `dest` and unpack it there. The
/// returned handle removes the staged archive when dropped.
fn stage_and_extract(data: &[u8], dest: &FsPath) -> Result<tempfile::NamedTempFile, ApiError> {
    std::fs::create_dir_all(dest)?;
    let mut staged = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".zip")
        .tempfile_in(dest)?;
    staged.write_all(data)?;
    staged.flush()?;

    let files = extract_archive(staged.path(), dest)?;
    info!("Extracted {files} files into {}", dest.display());
    Ok(staged)
}

async fn list_media(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<MediaItem>>, ApiError> {
    Ok(Json(state.db.list_media(user_id).await?))
}

#[derive(Debug, Deserialize)]
struct ConnectionsQuery {
    kind: Option<String>,
}

async fn list_connections(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<ConnectionsQuery>,
) -> Result<Json<Vec<Connection>>, ApiError> {
    let kind = params
        .kind
        .map(|kind| kind.parse::<RelationKind>())
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(state.db.list_connections(user_id, kind).await?))
}

async fn list_hashtags(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<FollowedHashtag>>, ApiError> {
    Ok(Json(state.db.list_hashtags(user_id).await?))
}

async fn media_file(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let relative = safe_relative_path(&path)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid media path: {path}")))?;
    let full_path = state.config.user_upload_dir(user_id).join(relative);

    match ServeFile::new(full_path).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(never) => match never {},
    }
}

/// Accept only plain relative paths, so lookups stay inside the user's
/// upload directory.
fn safe_relative_path(path: &str) -> Option<PathBuf> {
    let path = FsPath::new(path);
    let mut components = path.components().peekable();
    components.peek()?;
    components
        .all(|component| matches!(component, Component::Normal(_)))
        .then(|| path.to_path_buf())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
