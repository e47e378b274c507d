//! Request routing dispatch module
//!
//! Entry point for site requests: method validation, the debug overlay, the
//! bundle cascade and finally the host's default handling.

use crate::config::AppState;
use crate::handler::bundles::{self, Outcome};
use crate::handler::{debug, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, MatchContext};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, REFERER, SERVER, USER_AGENT,
};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for site request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (mut response, served_by) = dispatch(&req, &state).await;

    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    if state.access_log_enabled() {
        let format = &state.config.logging.access_log_format;
        log_access(&req, &response, served_by, peer_addr, started, format);
    }
    Ok(response)
}

async fn dispatch<B>(req: &Request<B>, state: &AppState) -> (Response<Full<Bytes>>, String) {
    let method = req.method();
    let is_head = *method == Method::HEAD;

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(method) {
        return (resp, "method".to_string());
    }

    let uri = req.uri();
    let path = routing::normalize_path(uri.path());
    let snapshot = state.store.snapshot().await;

    // 2. Debug overlay (admin only)
    if debug::is_requested(uri.query(), &state.config.admin.debug_param) {
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if state.config.admin.authorize(authorization) {
            let html = debug::render_overlay(
                &uri.to_string(),
                path,
                &state.host,
                &snapshot,
                &state.config.bundles.upload_dir,
            );
            return (http::build_html_response(html, is_head), "debug".to_string());
        }
    }

    // 3. Bundle cascade
    let host = &state.config.host;
    let ctx = MatchContext {
        snapshot: &snapshot,
        signals: &state.host,
        template_prefix: &state.config.bundles.template_prefix,
        reserved_prefixes: &host.reserved_prefixes,
        reserved_paths: &host.reserved_paths,
    };
    for candidate in routing::candidates(path, &ctx) {
        match bundles::serve_candidate(&candidate, state, is_head).await {
            Outcome::Served {
                response,
                served_by,
            } => return (response, served_by),
            Outcome::Defer => break,
            Outcome::Continue => {}
        }
    }

    // 4. Host default handling
    (
        static_files::serve_host(uri.path(), state, is_head).await,
        "host".to_string(),
    )
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

fn log_access<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    served_by: String,
    peer_addr: SocketAddr,
    started: Instant,
    format: &str,
) {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.served_by = served_by;
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::{BundleStore, PageRecord, PostTemplate};
    use http_body_util::BodyExt;
    use std::fs;

    struct Site {
        _dir: tempfile::TempDir,
        state: Arc<AppState>,
    }

    async fn site() -> Site {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let docroot = dir.path().join("public");
        fs::create_dir_all(uploads.join("home")).unwrap();
        fs::create_dir_all(uploads.join("landing")).unwrap();
        fs::create_dir_all(uploads.join("_post_template")).unwrap();
        fs::create_dir_all(&docroot).unwrap();

        fs::write(uploads.join("home/index.html"), "<html><head></head>home</html>").unwrap();
        fs::write(uploads.join("home/site.css"), "h{}").unwrap();
        fs::write(
            uploads.join("landing/index.html"),
            r#"<html><head><title>x</title></head><img src="./img/logo.png"></html>"#,
        )
        .unwrap();
        fs::write(uploads.join("landing/logo.png"), "png").unwrap();
        fs::write(uploads.join("_post_template/index.html"), "<head></head>post").unwrap();
        fs::write(uploads.join("_post_template/post.css"), "p{}").unwrap();
        fs::write(docroot.join("robots.txt"), "ua").unwrap();

        let mut config = Config::load_from("definitely/not/here").unwrap();
        config.logging.access_log = false;
        config.bundles.upload_dir = uploads.to_string_lossy().into_owned();
        config.host.document_root = Some(docroot.to_string_lossy().into_owned());
        config.host.single_post_prefixes = vec!["/blog/".to_string()];
        config.admin.token = "secret".to_string();

        let store = Arc::new(BundleStore::open(dir.path().join("bundles.toml")));
        store.upsert_page(PageRecord::new("home", "home")).await.unwrap();
        store
            .upsert_page(PageRecord::new("landing", "landing"))
            .await
            .unwrap();
        store
            .set_post_template(PostTemplate::new("_post_template"))
            .await
            .unwrap();

        Site {
            _dir: dir,
            state: Arc::new(AppState::with_store(&config, store)),
        }
    }

    async fn get(site: &Site, uri: &str) -> (Response<Full<Bytes>>, String) {
        let req = Request::builder().uri(uri).body(()).unwrap();
        let resp = handle_request(req, Arc::clone(&site.state), "127.0.0.1:9".parse().unwrap())
            .await
            .unwrap();
        let (parts, body) = resp.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (
            Response::from_parts(parts, Full::new(bytes.clone())),
            String::from_utf8_lossy(&bytes).into_owned(),
        )
    }

    #[tokio::test]
    async fn test_root_and_index_php_serve_home() {
        let site = site().await;
        let (resp, body) = get(&site, "/").await;
        assert_eq!(resp.status(), 200);
        assert!(body.contains("<base href=\"/\">"));
        assert_eq!(
            resp.headers()["Cache-Control"],
            "no-cache, no-store, must-revalidate"
        );

        let (_, again) = get(&site, "/index.php").await;
        assert_eq!(body, again);
    }

    #[tokio::test]
    async fn test_named_page_rewrites_and_injects_base() {
        let site = site().await;
        let (resp, body) = get(&site, "/landing/").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/html; charset=utf-8");
        assert!(body.contains("<head>\n<base href=\"/landing/\">"));
        assert!(body.contains(r#"src="/landing/img/logo.png""#));
    }

    #[tokio::test]
    async fn test_page_asset_flattened_fallback() {
        let site = site().await;
        let (resp, body) = get(&site, "/landing/img/logo.png").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body, "png");
        assert_eq!(resp.headers()["Content-Type"], "image/png");
        assert_eq!(resp.headers()["Cache-Control"], "public, max-age=86400");
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn test_traversal_is_not_served() {
        let site = site().await;
        let (resp, _) = get(&site, "/landing/../../bundles.toml").await;
        assert_eq!(resp.status(), 404);
        let (resp, _) = get(&site, "/landing/%2e%2e/%2e%2e/bundles.toml").await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_post_template_and_toggle() {
        let site = site().await;
        let (resp, body) = get(&site, "/blog/hello-world").await;
        assert_eq!(resp.status(), 200);
        assert!(body.contains("<base href=\"/_cpl_pt/\">"));

        let (resp, body) = get(&site, "/_cpl_pt/post.css").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body, "p{}");

        site.state.store.set_post_template_enabled(false).await.unwrap();
        let (resp, _) = get(&site, "/blog/hello-world").await;
        assert_eq!(resp.status(), 404);

        site.state.store.set_post_template_enabled(true).await.unwrap();
        let (resp, _) = get(&site, "/blog/hello-world").await;
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_home_asset_fallback_and_host() {
        let site = site().await;
        let (resp, body) = get(&site, "/site.css").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body, "h{}");

        let (resp, body) = get(&site, "/robots.txt").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body, "ua");

        let (resp, _) = get(&site, "/wp-login.php").await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_missing_page_folder_defers_to_host() {
        let site = site().await;
        fs::remove_dir_all(site.state.upload_dir.join("landing")).unwrap();
        let (resp, _) = get(&site, "/landing").await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_debug_overlay_requires_token() {
        let site = site().await;
        let (_, body) = get(&site, "/?cpl_debug=1").await;
        assert!(!body.contains("Custom Page Loader Debug"));

        let req = Request::builder()
            .uri("/?cpl_debug=1")
            .header("Authorization", "Bearer secret")
            .body(())
            .unwrap();
        let resp = handle_request(req, Arc::clone(&site.state), "127.0.0.1:9".parse().unwrap())
            .await
            .unwrap();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Custom Page Loader Debug"));
        assert!(body.contains("landing -&gt; landing"));
    }

    #[tokio::test]
    async fn test_methods() {
        let site = site().await;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(())
            .unwrap();
        let resp = handle_request(req, Arc::clone(&site.state), "127.0.0.1:9".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 405);

        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/landing")
            .body(())
            .unwrap();
        let resp = handle_request(req, Arc::clone(&site.state), "127.0.0.1:9".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert!(resp.headers().contains_key("Content-Length"));
        assert!(resp.into_body().collect().await.unwrap().to_bytes().is_empty());
    }
}
