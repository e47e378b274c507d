// API module entry
// Bundle management API served on the admin listener

mod handlers;
mod response;
mod types;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::AUTHORIZATION;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

// Re-export public types
pub use response::*;
pub use types::{EnabledRequest, Notice, NoticeStatus, PageView};

/// API route handler
///
/// Checks the bearer token, then dispatches on method and path.
pub async fn handle_admin_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    let response = if method == Method::GET && path == "/v1/health" {
        handlers::handle_health()
    } else if !state.config.admin.authorize(
        req.headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    ) {
        unauthorized()
    } else {
        route(req, state, &method, &path).await
    };

    logger::log_admin_request(method.as_str(), &path, response.status().as_u16());
    Ok(response)
}

async fn route<B>(
    req: Request<B>,
    state: Arc<AppState>,
    method: &Method,
    path: &str,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (&Method::GET, ["v1", "pages"]) => handlers::handle_list_pages(&state).await,
        (&Method::PUT, ["v1", "pages", slug]) => handlers::handle_put_page(req, state, slug).await,
        (&Method::DELETE, ["v1", "pages", slug]) => handlers::handle_delete_page(state, slug).await,
        (&Method::GET, ["v1", "post-template"]) => handlers::handle_get_template(&state).await,
        (&Method::PUT, ["v1", "post-template"]) => handlers::handle_put_template(req, state).await,
        (&Method::DELETE, ["v1", "post-template"]) => handlers::handle_delete_template(state).await,
        (&Method::PUT, ["v1", "post-template", "enabled"]) => {
            handlers::handle_template_enabled(req, state).await
        }
        _ => not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::archive::tests::make_zip;
    use crate::config::Config;
    use crate::store::BundleStore;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    struct Admin {
        dir: tempfile::TempDir,
        state: Arc<AppState>,
    }

    fn admin(token: &str) -> Admin {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from("definitely/not/here").unwrap();
        config.bundles.upload_dir = dir.path().join("uploads").to_string_lossy().into_owned();
        config.admin.token = token.to_string();
        config.http.max_upload_size = 64 * 1024;
        config.http.max_body_size = 64;
        let store = Arc::new(BundleStore::open(dir.path().join("bundles.toml")));
        Admin {
            state: Arc::new(AppState::with_store(&config, store)),
            dir,
        }
    }

    async fn call(
        admin: &Admin,
        method: Method,
        uri: &str,
        body: Vec<u8>,
    ) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", "Bearer tok")
            .body(Full::new(Bytes::from(body)))
            .unwrap();
        let resp = handle_admin_request(req, Arc::clone(&admin.state))
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upload_list_delete_page() {
        let admin = admin("tok");
        let zip = make_zip(&[("dist/index.html", "<html></html>"), ("dist/js/app.js", "1")]);

        let (status, body) = call(&admin, Method::PUT, "/v1/pages/My%20Landing", zip).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["page"]["slug"], "my-landing");
        assert_eq!(body["page"]["url"], "/my-landing");
        let folder = admin.dir.path().join("uploads/my-landing");
        assert!(folder.join("index.html").is_file());
        assert!(folder.join("app.js").is_file());

        let (status, body) = call(&admin, Method::GET, "/v1/pages", Vec::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pages"][0]["slug"], "my-landing");

        let (status, _) = call(&admin, Method::DELETE, "/v1/pages/my-landing", Vec::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!folder.exists());
        assert!(admin.state.store.snapshot().await.pages.is_empty());

        let (status, body) = call(&admin, Method::DELETE, "/v1/pages/my-landing", Vec::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_reupload_keeps_position() {
        let admin = admin("tok");
        for slug in ["home", "promo", "home"] {
            let zip = make_zip(&[("index.html", slug)]);
            call(&admin, Method::PUT, &format!("/v1/pages/{slug}"), zip).await;
        }
        let snapshot = admin.state.store.snapshot().await;
        let slugs: Vec<_> = snapshot.pages.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["home", "promo"]);
    }

    #[tokio::test]
    async fn test_upload_failures_are_notices() {
        let admin = admin("tok");
        let (status, body) = call(&admin, Method::PUT, "/v1/pages/x", Vec::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No archive uploaded");

        let (status, body) = call(&admin, Method::PUT, "/v1/pages/x", b"nope".to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(admin.state.store.snapshot().await.pages.is_empty());

        let (status, _) = call(&admin, Method::PUT, "/v1/pages/x", vec![0; 65 * 1024]).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let (status, _) = call(&admin, Method::PUT, "/v1/pages/%21%21", Vec::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_of_one_slug_do_not_mix() {
        let admin = admin("tok");
        let v1 = make_zip(&[("index.html", "one"), ("one.css", "1")]);
        let v2 = make_zip(&[("index.html", "two"), ("two.css", "2")]);

        let ((first, _), (second, _)) = tokio::join!(
            call(&admin, Method::PUT, "/v1/pages/landing", v1),
            call(&admin, Method::PUT, "/v1/pages/landing", v2),
        );
        assert!(first.is_success() && second.is_success());

        let folder = admin.dir.path().join("uploads/landing");
        let index = std::fs::read_to_string(folder.join("index.html")).unwrap();
        let expected_css = if index == "one" { "one.css" } else { "two.css" };
        let mut files: Vec<_> = std::fs::read_dir(&folder)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files, [expected_css, "index.html"]);
    }

    #[tokio::test]
    async fn test_json_body_bounded_by_max_body_size() {
        let admin = admin("tok");
        let padded = format!("{{\"enabled\":false{}}}", " ".repeat(64));
        let (status, body) = call(
            &admin,
            Method::PUT,
            "/v1/post-template/enabled",
            padded.into_bytes(),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_post_template_lifecycle() {
        let admin = admin("tok");
        let (status, _) = call(
            &admin,
            Method::PUT,
            "/v1/post-template/enabled",
            br#"{"enabled":false}"#.to_vec(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let zip = make_zip(&[("index.html", "post")]);
        let (status, body) = call(&admin, Method::PUT, "/v1/post-template", zip).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["post_template"]["folder"], "_post_template");

        let (status, _) = call(
            &admin,
            Method::PUT,
            "/v1/post-template/enabled",
            br#"{"enabled":false}"#.to_vec(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&admin, Method::GET, "/v1/post-template", Vec::new()).await;
        assert_eq!(body["post_template"]["enabled"], false);
        assert!(admin.dir.path().join("uploads/_post_template/index.html").is_file());

        let (status, _) = call(&admin, Method::DELETE, "/v1/post-template", Vec::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!admin.dir.path().join("uploads/_post_template").exists());
    }

    #[tokio::test]
    async fn test_auth_required() {
        let admin = admin("tok");
        let req = Request::builder()
            .uri("/v1/pages")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_admin_request(req, Arc::clone(&admin.state))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .uri("/v1/health")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_admin_request(req, Arc::clone(&admin.state))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let admin = admin("");
        let (status, body) = call(&admin, Method::GET, "/v1/nothing", Vec::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }
}
