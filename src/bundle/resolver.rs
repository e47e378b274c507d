//! Asset resolution inside a bundle folder.
//!
//! A relative request path is tried at its exact location first, then by
//! basename at the folder root (bundles are flattened on upload, but their
//! HTML may still reference nested paths). Every candidate must canonicalize
//! to a location inside the canonical bundle folder.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

use crate::error::{LoaderError, Result};
use crate::http::mime;
use crate::logger;

/// A file found inside a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Canonical absolute path
    pub path: PathBuf,
    pub content_type: Option<&'static str>,
}

/// Percent-decode a request-relative path
pub fn decode_relative(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Resolve `relative` (still percent-encoded) inside `folder`
pub fn resolve(folder: &Path, relative: &str) -> Result<ResolvedAsset> {
    resolve_decoded(folder, &decode_relative(relative))
}

/// Resolve an already decoded relative path inside `folder`
pub fn resolve_decoded(folder: &Path, relative: &str) -> Result<ResolvedAsset> {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        return Err(LoaderError::NotFound(String::new()));
    }

    let exact = folder.join(relative);
    let first = match contained_file(&exact, folder) {
        Ok(path) => return Ok(asset(path)),
        Err(e) => e,
    };

    // Flattened fallback: basename at the folder root
    if let Some(name) = Path::new(relative).file_name() {
        let flat = folder.join(name);
        if flat != exact {
            if let Ok(path) = contained_file(&flat, folder) {
                return Ok(asset(path));
            }
        }
    }

    Err(first)
}

fn asset(path: PathBuf) -> ResolvedAsset {
    let content_type = mime::content_type_for(&path);
    ResolvedAsset { path, content_type }
}

/// Canonicalize `path` and require a regular file under canonical `base`
fn contained_file(path: &Path, base: &Path) -> Result<PathBuf> {
    let not_found = || LoaderError::NotFound(path.display().to_string());

    let real = path.canonicalize().map_err(|_| not_found())?;
    let real_base = base.canonicalize().map_err(|_| not_found())?;

    if !real.starts_with(&real_base) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path.display(),
            real.display()
        ));
        return Err(LoaderError::Forbidden(real));
    }

    if !real.is_file() {
        return Err(not_found());
    }

    Ok(real)
}
