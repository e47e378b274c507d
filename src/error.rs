//! Error taxonomy for bundle serving and administration.
//!
//! Serving-path errors never reach the client: every variant degrades to
//! the host's default handling. Administrative errors are reported as JSON
//! notices by the admin API.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Entry document or asset missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Resolved path escapes the bundle folder.
    #[error("path escapes bundle folder: {}", .0.display())]
    Forbidden(PathBuf),

    /// Archive missing, unreadable, or extraction failed.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// Mapping references a folder that no longer exists.
    #[error("bundle folder missing for '{slug}': {}", .folder.display())]
    ConfigInconsistent { slug: String, folder: PathBuf },

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for LoaderError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::UploadFailed(err.to_string())
    }
}

pub type Result<T, E = LoaderError> = std::result::Result<T, E>;
