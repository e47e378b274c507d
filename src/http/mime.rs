//! MIME type detection module
//!
//! Content types are derived in two steps: the general extension table
//! (what a host platform would detect), then a fixed table of bundle asset
//! types. Unknown extensions yield no content type at all.

use std::path::Path;

/// General-purpose detection by extension
fn detect(extension: &str) -> Option<&'static str> {
    let ct = match extension {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "txt" | "md" => "text/plain; charset=utf-8",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "application/javascript",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",

        _ => return None,
    };
    Some(ct)
}

/// Fixed bundle asset table, consulted when general detection has no answer
fn bundle_fallback(extension: &str) -> Option<&'static str> {
    let ct = match extension {
        "css" => "text/css",
        "js" => "application/javascript",
        "svg" => "image/svg+xml",
        "json" | "map" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        _ => return None,
    };
    Some(ct)
}

/// Content type for a file path, `None` when the extension is unknown
///
/// # Examples
/// ```
/// use custom_page_loader::http::mime::content_type_for;
/// assert_eq!(content_type_for("app.css"), Some("text/css"));
/// assert_eq!(content_type_for("font.woff2"), Some("font/woff2"));
/// assert_eq!(content_type_for("blob.xyz"), None);
/// ```
pub fn content_type_for(path: impl AsRef<Path>) -> Option<&'static str> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    detect(&ext).or_else(|| bundle_fallback(&ext))
}
