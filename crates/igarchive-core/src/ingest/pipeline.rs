//! Archive scan driver.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use super::classify::{EntryRule, classify};
use super::decode::decode;
use super::normalize::normalize;
use crate::Database;
use crate::error::{Error, Result};
use crate::models::Fact;

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub entries_seen: usize,
    pub entries_recognized: usize,
    pub entries_unrecognized: usize,
    /// Recognized entries that could not be opened, decoded or normalized.
    pub entries_failed: usize,
    pub facts_written: usize,
    pub facts_failed: usize,
}

impl IngestReport {
    /// True when every recognized entry and every fact went through.
    pub fn is_complete(&self) -> bool {
        self.entries_failed == 0 && self.facts_failed == 0
    }
}

/// Ingest the archive at `path` for `user_id`.
pub async fn ingest_archive(db: &Database, path: &Path, user_id: i64) -> Result<IngestReport> {
    let path = path.to_path_buf();
    ingest_with(db, user_id, move || {
        File::open(&path).map_err(|err| Error::ArchiveOpen(ZipError::Io(err)))
    })
    .await
}

/// Ingest an archive from any seekable reader.
///
/// Entries are visited once, in archive order. Reading and decoding run on
/// the blocking pool; only the writes happen on the caller's task. Only
/// opening the archive can fail the call; everything after that is absorbed
/// and reported.
pub async fn ingest_reader<R>(db: &Database, reader: R, user_id: i64) -> Result<IngestReport>
where
    R: Read + Seek + Send + 'static,
{
    ingest_with(db, user_id, move || Ok(reader)).await
}

async fn ingest_with<R, F>(db: &Database, user_id: i64, open: F) -> Result<IngestReport>
where
    R: Read + Seek,
    F: FnOnce() -> Result<R> + Send + 'static,
{
    let now = Utc::now();
    let (mut report, entries) = tokio::task::spawn_blocking(move || scan(open()?, user_id, now))
        .await
        .map_err(|err| Error::Other(format!("archive scan task failed: {err}")))??;

    for (rule, facts) in entries {
        let mut written = 0usize;
        for fact in &facts {
            match write_fact(db, fact).await {
                Ok(_) => written += 1,
                Err(err) => {
                    warn!(path = rule.path, error = %err, "Failed to write record");
                    report.facts_failed += 1;
                }
            }
        }
        report.facts_written += written;
        info!(path = rule.path, records = facts.len(), written, "Finished export file");
    }

    info!(
        user_id,
        recognized = report.entries_recognized,
        failed = report.entries_failed,
        written = report.facts_written,
        "Archive ingestion finished"
    );
    Ok(report)
}

/// Facts decoded from one recognized entry.
type EntryFacts = (&'static EntryRule, Vec<Fact>);

/// Classify, read, decode and normalize every entry. Entry failures are
/// counted in the returned report and skipped.
fn scan<R: Read + Seek>(
    reader: R,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<(IngestReport, Vec<EntryFacts>)> {
    let mut archive = ZipArchive::new(reader).map_err(Error::ArchiveOpen)?;
    let mut report = IngestReport::default();
    let mut entries = Vec::new();

    info!(user_id, entries = archive.len(), "Scanning archive");

    for index in 0..archive.len() {
        report.entries_seen += 1;

        let Some(rule) = archive.name_for_index(index).and_then(classify) else {
            debug!(index, "Skipping unrecognized entry");
            report.entries_unrecognized += 1;
            continue;
        };
        report.entries_recognized += 1;
        info!(path = rule.path, kind = %rule.kind, "Found export file");

        match read_entry(&mut archive, index, rule)
            .and_then(|bytes| decode(rule, &bytes))
            .and_then(|decoded| normalize(rule, decoded, user_id, now))
        {
            Ok(facts) => entries.push((rule, facts)),
            Err(err) => {
                warn!(path = rule.path, error = %err, "Skipping entry");
                report.entries_failed += 1;
            }
        }
    }

    Ok((report, entries))
}

/// Read one entry fully. The entry stream is dropped before returning.
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    rule: &EntryRule,
) -> Result<Vec<u8>> {
    let entry_error = |reason: String| Error::EntryOpen {
        path: rule.path.to_string(),
        reason,
    };
    let mut entry = archive
        .by_index(index)
        .map_err(|err| entry_error(err.to_string()))?;
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|err| entry_error(err.to_string()))?;
    Ok(bytes)
}

async fn write_fact(db: &Database, fact: &Fact) -> Result<u64> {
    match fact {
        Fact::Media(media) => db.write_media(media).await,
        Fact::Relation(relation) => db.write_relation(relation).await,
    }
}
