//! Post-extraction flattening.
//!
//! Moves every file below the bundle root up to the root itself and removes
//! the emptied directories. Files are visited in sorted order, so on a name
//! collision the last path in that order wins.

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::Result;
use crate::logger;

/// Flatten `root` in place; returns how many files were moved
pub fn flatten(root: &Path) -> Result<usize> {
    let nested: Vec<_> = WalkDir::new(root)
        .min_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect();

    let mut moved = 0;
    for path in nested {
        let Some(name) = path.file_name() else { continue };
        let target = root.join(name);

        if target.is_dir() {
            logger::log_warning(&format!(
                "Flatten skipped {}: a directory named {} exists at the bundle root",
                path.display(),
                name.to_string_lossy()
            ));
            continue;
        }
        if target.exists() {
            fs::remove_file(&target)?;
        }
        fs::rename(&path, &target)?;
        moved += 1;
    }

    remove_empty_dirs(root)?;
    Ok(moved)
}

/// Remove directories under `root` that hold no files, deepest first
fn remove_empty_dirs(root: &Path) -> Result<()> {
    let dirs: Vec<_> = WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect();

    for dir in dirs {
        if fs::read_dir(&dir)?.next().is_none() {
            fs::remove_dir(&dir)?;
        }
    }
    Ok(())
}
