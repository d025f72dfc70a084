//! Ingest helpers for the CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use igarchive_core::{Config, Database, IngestReport, extract_archive, ingest_archive};

#[derive(Debug, Clone, serde::Serialize)]
pub struct IngestOutcome {
    pub user_id: i64,
    pub archive: PathBuf,
    /// Files unpacked under the user's upload directory, when requested.
    pub extracted: Option<usize>,
    pub report: IngestReport,
}

pub async fn ingest_file(
    db: &Database,
    config: &Config,
    archive: &Path,
    user_id: i64,
    extract: bool,
) -> Result<IngestOutcome> {
    let archive = archive
        .canonicalize()
        .with_context(|| format!("Archive '{}' not found", archive.display()))?;

    let extracted = if extract {
        let dest = config.user_upload_dir(user_id);
        let source = archive.clone();
        let count = tokio::task::spawn_blocking(move || extract_archive(&source, &dest))
            .await
            .context("Extraction task failed")??;
        Some(count)
    } else {
        None
    };

    let report = ingest_archive(db, &archive, user_id)
        .await
        .with_context(|| format!("Failed to ingest '{}'", archive.display()))?;

    Ok(IngestOutcome {
        user_id,
        archive,
        extracted,
        report,
    })
}
