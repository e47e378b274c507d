//! Host default handling
//!
//! Requests no bundle claims are answered from the configured document root,
//! with index file support and a containment check. Without a document root,
//! or when nothing is found, the answer is 404.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::percent_decode_str;
use std::path::Path;
use tokio::fs;

use crate::config::AppState;
use crate::http::{self, mime};
use crate::logger;

/// Serve `path` the way the host would without any bundle in front of it
pub async fn serve_host(path: &str, state: &AppState, is_head: bool) -> Response<Full<Bytes>> {
    let Some(root) = state.config.host.document_root.as_deref() else {
        return http::build_404_response();
    };

    match load_from_directory(root, path, &state.config.host.index_files).await {
        Some((content, content_type)) => http::build_file_response(content, content_type, is_head),
        None => http::build_404_response(),
    }
}

/// Load a file from `static_dir`, trying index files for directories
pub async fn load_from_directory(
    static_dir: &str,
    path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, Option<&'static str>)> {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let relative_path = decoded.trim_start_matches('/');

    let static_dir_canonical = match Path::new(static_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Document root not found or inaccessible '{static_dir}': {e}"
            ));
            return None;
        }
    };

    let mut file_path = static_dir_canonical.join(relative_path);
    if file_path.is_dir() {
        file_path = index_files
            .iter()
            .map(|index| file_path.join(index))
            .find(|candidate| candidate.is_file())?;
    }

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }
    if !file_path_canonical.is_file() {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path_canonical.display(),
                e
            ));
            return None;
        }
    };

    Some((content, mime::content_type_for(&file_path_canonical)))
}
