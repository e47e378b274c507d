//! Zip archive extraction into a bundle folder.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::Path;

use crate::error::{LoaderError, Result};

/// Metadata directories some archivers add; never part of a bundle
const SKIPPED_PREFIXES: &[&str] = &["__MACOSX/"];

/// Extract `archive` into `target`, which must already exist
///
/// Entries whose names would land outside `target` abort the extraction.
/// Returns the number of files written.
pub fn extract(archive: &[u8], target: &Path) -> Result<usize> {
    if archive.is_empty() {
        return Err(LoaderError::UploadFailed("archive is empty".to_string()));
    }

    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if SKIPPED_PREFIXES.iter().any(|p| entry.name().starts_with(p)) {
            continue;
        }

        let Some(relative) = entry.enclosed_name() else {
            return Err(LoaderError::UploadFailed(format!(
                "archive entry escapes bundle folder: {}",
                entry.name()
            )));
        };
        let out_path = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    Ok(written)
}
