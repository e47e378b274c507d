//! Diagnostics overlay for administrators
//!
//! Dumps the request, the host routing signals, the page mapping and the
//! post template record as a plain HTML page.

use std::fmt::Write;

use crate::routing::HostSignals;
use crate::store::SiteSnapshot;

/// True when `query` carries `param`, with or without a value
pub fn is_requested(query: Option<&str>, param: &str) -> bool {
    !param.is_empty()
        && query.is_some_and(|q| {
            q.split('&')
                .any(|pair| pair.split('=').next() == Some(param))
        })
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the overlay for one request
pub fn render_overlay(
    uri: &str,
    path: &str,
    signals: &dyn HostSignals,
    snapshot: &SiteSnapshot,
    upload_dir: &str,
) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "Request URI: {uri}");
    let _ = writeln!(body, "Normalized Path: {path}");
    let _ = writeln!(body, "Is Front Page: {}", yes_no(signals.is_front_page(path)));
    let _ = writeln!(body, "Is Home: {}", yes_no(signals.is_home(path)));
    let _ = writeln!(body, "Is Single Post: {}", yes_no(signals.is_single_post(path)));
    let _ = writeln!(body, "Upload Dir: {upload_dir}");

    let _ = writeln!(body, "\nPages ({}):", snapshot.pages.len());
    for page in snapshot.pages.iter() {
        let _ = writeln!(
            body,
            "  {} -> {} (uploaded {})",
            page.slug,
            page.folder,
            page.uploaded_at.to_rfc3339()
        );
    }

    match &snapshot.post_template {
        Some(t) => {
            let _ = writeln!(
                body,
                "\nPost Template: folder={} active={} enabled={} uploaded={}",
                t.folder,
                t.active,
                t.enabled,
                t.uploaded_at.to_rfc3339()
            );
        }
        None => body.push_str("\nPost Template: none\n"),
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Custom Page Loader Debug</title></head>\n<body>\n<h1>Custom Page Loader Debug</h1>\n<pre>{}</pre>\n</body>\n</html>\n",
        escape_html(&body)
    )
}
