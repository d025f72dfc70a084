//! Archive ingestion pipeline.
//!
//! An export archive is scanned entry by entry. Each entry path is looked up
//! in [`classify::ENTRY_TABLE`]; recognized entries are decoded, normalized
//! into [`Fact`](crate::models::Fact)s and upserted. Only a failure to open
//! the archive itself is returned as an error: per-entry and per-fact
//! failures are logged, counted in the [`IngestReport`], and skipped.

pub mod classify;
pub mod decode;
pub mod extract;
pub mod normalize;
pub mod pipeline;

pub use classify::{EntryKind, EntryRule, classify};
pub use extract::{extract_archive, extract_reader};
pub use pipeline::{IngestReport, ingest_archive, ingest_reader};
