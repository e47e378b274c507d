//! Entry document rewriting.
//!
//! Two passes, selected by [`RewriteMode`]:
//! - `<base href>` injection right after the opening `<head>` tag (or at the
//!   top of the document when there is none)
//! - smart rewriting of quoted `src`/`href` attribute values that name a file
//!   present in the bundle, followed by base injection for anything missed
//!
//! Attribute values are located by a small tag scanner, not by pattern
//! matching over the whole document, so comments, raw `<script>`/`<style>`
//! bodies and text content are never touched. Documents are handled as raw
//! bytes; any encoding passes through unchanged outside rewritten values.

use crate::config::RewriteMode;

/// Render an entry document for serving
///
/// `exists` answers whether a decoded, bundle-relative path resolves to a file.
pub fn render(
    html: &[u8],
    base_url: &str,
    mode: RewriteMode,
    exists: impl Fn(&str) -> bool,
) -> Vec<u8> {
    match mode {
        RewriteMode::BaseTag => inject_base_tag(html, base_url),
        RewriteMode::Smart => inject_base_tag(&rewrite_asset_urls(html, base_url, exists), base_url),
    }
}

/// Insert `<base href>` after the first `<head>` tag, else prepend it
pub fn inject_base_tag(html: &[u8], base_url: &str) -> Vec<u8> {
    let tag = format!("<base href=\"{}\">", escape_attr(base_url));
    let mut out = Vec::with_capacity(html.len() + tag.len() + 1);
    match find_head_end(html) {
        Some(end) => {
            out.extend_from_slice(&html[..end]);
            out.push(b'\n');
            out.extend_from_slice(tag.as_bytes());
            out.extend_from_slice(&html[end..]);
        }
        None => {
            out.extend_from_slice(tag.as_bytes());
            out.extend_from_slice(html);
        }
    }
    out
}

/// Byte offset just past the first `<head>` / `<head attr…>` tag
fn find_head_end(bytes: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = find_ci(bytes, b"<head", from) {
        let after = pos + 5;
        match bytes.get(after) {
            Some(b'>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() || *c == b'/' => {
                return bytes[after..]
                    .iter()
                    .position(|&c| c == b'>')
                    .map(|p| after + p + 1);
            }
            // "<header>" and friends
            _ => from = after,
        }
    }
    None
}

/// Rewrite `src`/`href` values that resolve inside the bundle to absolute URLs
pub fn rewrite_asset_urls(html: &[u8], base_url: &str, exists: impl Fn(&str) -> bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(html.len() + 256);
    let mut copied = 0;

    for span in attribute_values(html) {
        // Values that are not UTF-8 are never rewritten
        let Ok(value) = std::str::from_utf8(&html[span.start..span.end]) else {
            continue;
        };
        if let Some(new_value) = rewrite_value(value, base_url, &exists) {
            out.extend_from_slice(&html[copied..span.start]);
            out.extend_from_slice(escape_attr_for(&new_value, span.quote).as_bytes());
            copied = span.end;
        }
    }

    out.extend_from_slice(&html[copied..]);
    out
}

/// New attribute value for one `src`/`href`, None to leave it untouched
fn rewrite_value(value: &str, base_url: &str, exists: &impl Fn(&str) -> bool) -> Option<String> {
    let v = value.trim();
    if v.is_empty() || is_external(v) {
        return None;
    }

    // Minimal trim: leading "./" runs and slashes
    let minimal = v.trim_start_matches("./").trim_start_matches('/');
    // Aggressive trim: every leading dot and slash ("../../img" -> "img")
    let aggressive = v.trim_start_matches(['.', '/']);

    [minimal, aggressive]
        .into_iter()
        .find(|candidate| {
            let probe = strip_suffixes(candidate);
            !probe.is_empty()
                && !probe.split('/').any(|seg| seg == "..")
                && exists(&super::resolver::decode_relative(probe))
        })
        .map(|candidate| format!("{base_url}{candidate}"))
}

fn is_external(v: &str) -> bool {
    let lower = v.get(..7).unwrap_or(v).to_ascii_lowercase();
    v.starts_with("//")
        || v.starts_with('#')
        || lower.starts_with("http")
        || lower.starts_with("data:")
        || lower.starts_with("mailto:")
}

/// Path part only: drop `?query` and `#fragment`
fn strip_suffixes(candidate: &str) -> &str {
    let end = candidate.find(['?', '#']).unwrap_or(candidate.len());
    &candidate[..end]
}

/// A quoted attribute value inside a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ValueSpan {
    /// Byte range of the value, quotes excluded
    start: usize,
    end: usize,
    quote: u8,
}

/// Spans of quoted `src`/`href` values in document order
fn attribute_values(bytes: &[u8]) -> Vec<ValueSpan> {
    let mut spans = Vec::new();
    let mut i = 0;

    while let Some(lt) = memchr(b'<', bytes, i) {
        i = lt + 1;

        if bytes[i..].starts_with(b"!--") {
            i = find(bytes, b"-->", i + 3).map_or(bytes.len(), |p| p + 3);
            continue;
        }
        if !bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
            continue;
        }

        let name_end = scan_while(bytes, i, |c| !c.is_ascii_whitespace() && c != b'>' && c != b'/');
        let tag_name = &bytes[i..name_end];
        i = scan_tag_attributes(bytes, name_end, &mut spans);

        for raw in [&b"script"[..], &b"style"[..]] {
            if tag_name.eq_ignore_ascii_case(raw) {
                let mut close = Vec::with_capacity(raw.len() + 2);
                close.extend_from_slice(b"</");
                close.extend_from_slice(raw);
                i = find_ci(bytes, &close, i).unwrap_or(bytes.len());
            }
        }
    }

    spans
}

/// Walk attributes from `i` to the end of the tag; returns the index after `>`
fn scan_tag_attributes(bytes: &[u8], mut i: usize, spans: &mut Vec<ValueSpan>) -> usize {
    loop {
        i = scan_while(bytes, i, |c| c.is_ascii_whitespace() || c == b'/');
        match bytes.get(i) {
            None => return bytes.len(),
            Some(b'>') => return i + 1,
            Some(_) => {}
        }

        let name_start = i;
        i = scan_while(bytes, i, |c| {
            !c.is_ascii_whitespace() && c != b'=' && c != b'>' && c != b'/'
        });
        let name = &bytes[name_start..i];

        let after_ws = scan_while(bytes, i, |c| c.is_ascii_whitespace());
        if bytes.get(after_ws) != Some(&b'=') {
            // Valueless attribute
            continue;
        }
        i = scan_while(bytes, after_ws + 1, |c| c.is_ascii_whitespace());

        match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => {
                let start = i + 1;
                let end = memchr(q, bytes, start).unwrap_or(bytes.len());
                if end < bytes.len()
                    && (name.eq_ignore_ascii_case(b"src") || name.eq_ignore_ascii_case(b"href"))
                {
                    spans.push(ValueSpan { start, end, quote: q });
                }
                i = (end + 1).min(bytes.len());
            }
            // Unquoted values are left alone
            Some(_) => i = scan_while(bytes, i, |c| !c.is_ascii_whitespace() && c != b'>'),
            None => return bytes.len(),
        }
    }
}

fn scan_while(bytes: &[u8], mut i: usize, pred: impl Fn(u8) -> bool) -> usize {
    while i < bytes.len() && pred(bytes[i]) {
        i += 1;
    }
    i
}

fn memchr(needle: u8, bytes: &[u8], from: usize) -> Option<usize> {
    bytes.get(from..)?.iter().position(|&c| c == needle).map(|p| p + from)
}

fn find(bytes: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn find_ci(bytes: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|p| p + from)
}

/// Escape for a double-quoted attribute value
fn escape_attr(value: &str) -> String {
    escape_attr_for(value, b'"')
}

/// Escape the quote in use plus `<`/`>`; `&` stays so existing entities survive
fn escape_attr_for(value: &str, quote: u8) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' if quote == b'"' => out.push_str("&quot;"),
            '\'' if quote == b'\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
