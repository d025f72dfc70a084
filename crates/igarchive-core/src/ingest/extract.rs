//! Unpack an export archive so its media files can be served.

use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};

/// Extract the archive at `archive_path` under `dest`.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive_path).map_err(|err| Error::ArchiveOpen(ZipError::Io(err)))?;
    extract_reader(file, dest)
}

/// Extract every file entry under `dest`, returning how many files were
/// written. Entries whose names would land outside `dest` are skipped.
pub fn extract_reader<R: Read + Seek>(reader: R, dest: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(reader).map_err(Error::ArchiveOpen)?;
    fs::create_dir_all(dest)?;

    let mut extracted = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(name = entry.name(), "Skipping entry outside extraction root");
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    debug!(dest = %dest.display(), files = extracted, "Extracted archive");
    Ok(extracted)
}
