// Bundle management handlers
// Upload, delete and list page bundles and the post template

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::path::PathBuf;
use std::sync::Arc;

use super::response::{error, json_response, ok, ok_with};
use super::types::{EnabledRequest, PageData, PageListData, PageView, TemplateData};
use crate::bundle::upload::{self, TEMPLATE_FOLDER};
use crate::config::AppState;
use crate::error::LoaderError;
use crate::logger;
use crate::store::{PageRecord, PostTemplate};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Liveness probe
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// List configured pages in mapping order
pub async fn handle_list_pages(state: &AppState) -> Response<Full<Bytes>> {
    let snapshot = state.store.snapshot().await;
    let site_url = &state.config.host.site_url;
    let pages: Vec<PageView> = snapshot
        .pages
        .iter()
        .map(|record| PageView::new(record, site_url))
        .collect();

    let message = format!("{} page(s) configured", pages.len());
    ok_with(StatusCode::OK, &message, PageListData { pages })
}

/// Upload a zip bundle for `raw_slug`, replacing any previous upload
pub async fn handle_put_page<B>(
    req: Request<B>,
    state: Arc<AppState>,
    raw_slug: &str,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let Some(slug) = slug_from_path(raw_slug) else {
        return error(StatusCode::BAD_REQUEST, "Invalid slug");
    };

    let archive = match read_archive(req, state.config.http.max_upload_size).await {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    if let Err(e) = deploy(&state, &slug, archive).await {
        return loader_error(&e);
    }

    let record = PageRecord::new(&slug, &slug);
    match state.store.upsert_page(record.clone()).await {
        Ok(previous) => {
            let (status, verb) = if previous.is_some() {
                (StatusCode::OK, "updated")
            } else {
                (StatusCode::CREATED, "uploaded")
            };
            let page = PageView::new(&record, &state.config.host.site_url);
            ok_with(status, &format!("Page '{slug}' {verb}"), PageData { page })
        }
        Err(e) => loader_error(&e),
    }
}

/// Remove a page mapping and its folder
pub async fn handle_delete_page(state: Arc<AppState>, raw_slug: &str) -> Response<Full<Bytes>> {
    let Some(slug) = slug_from_path(raw_slug) else {
        return error(StatusCode::BAD_REQUEST, "Invalid slug");
    };

    let removed = match state.store.remove_page(&slug).await {
        Ok(Some(record)) => record,
        Ok(None) => return error(StatusCode::NOT_FOUND, &format!("Page '{slug}' not found")),
        Err(e) => return loader_error(&e),
    };

    if let Err(e) = remove_folder(&state, removed.folder).await {
        return loader_error(&e);
    }
    ok(&format!("Page '{slug}' deleted"))
}

pub async fn handle_get_template(state: &AppState) -> Response<Full<Bytes>> {
    let snapshot = state.store.snapshot().await;
    let message = match &snapshot.post_template {
        Some(t) if t.is_serving() => "Post template is serving",
        Some(_) => "Post template is uploaded but disabled",
        None => "No post template uploaded",
    };
    ok_with(
        StatusCode::OK,
        message,
        TemplateData {
            post_template: snapshot.post_template.clone(),
        },
    )
}

/// Upload the post template bundle (active and enabled)
pub async fn handle_put_template<B>(req: Request<B>, state: Arc<AppState>) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let archive = match read_archive(req, state.config.http.max_upload_size).await {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    if let Err(e) = deploy(&state, TEMPLATE_FOLDER, archive).await {
        return loader_error(&e);
    }

    let template = PostTemplate::new(TEMPLATE_FOLDER);
    match state.store.set_post_template(template.clone()).await {
        Ok(()) => ok_with(
            StatusCode::OK,
            "Post template uploaded",
            TemplateData {
                post_template: Some(template),
            },
        ),
        Err(e) => loader_error(&e),
    }
}

/// Toggle template serving without touching its files
pub async fn handle_template_enabled<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let body = match read_body(req, state.config.http.max_body_size).await {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let request: EnabledRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return error(StatusCode::BAD_REQUEST, &format!("Invalid JSON: {e}")),
    };

    match state.store.set_post_template_enabled(request.enabled).await {
        Ok(true) => {
            let state_word = if request.enabled { "enabled" } else { "disabled" };
            ok(&format!("Post template {state_word}"))
        }
        Ok(false) => error(StatusCode::NOT_FOUND, "No post template uploaded"),
        Err(e) => loader_error(&e),
    }
}

pub async fn handle_delete_template(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let removed = match state.store.clear_post_template().await {
        Ok(Some(template)) => template,
        Ok(None) => return error(StatusCode::NOT_FOUND, "No post template uploaded"),
        Err(e) => return loader_error(&e),
    };

    if let Err(e) = remove_folder(&state, removed.folder).await {
        return loader_error(&e);
    }
    ok("Post template deleted")
}

fn slug_from_path(raw: &str) -> Option<String> {
    upload::sanitize_slug(&percent_decode_str(raw).decode_utf8_lossy())
}

/// Collect an upload body, bounded by `max_size`
async fn read_archive<B>(req: Request<B>, max_size: u64) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let bytes = read_body(req, max_size).await?;
    if bytes.is_empty() {
        Err(error(StatusCode::BAD_REQUEST, "No archive uploaded"))
    } else {
        Ok(bytes)
    }
}

/// Collect a request body; 413 once it passes `max_size`
async fn read_body<B>(req: Request<B>, max_size: u64) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(max_size).unwrap_or(usize::MAX);
    match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(error(
            StatusCode::PAYLOAD_TOO_LARGE,
            &format!("Request body exceeds {max_size} bytes"),
        )),
        Err(e) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            Err(error(StatusCode::BAD_REQUEST, "Failed to read request body"))
        }
    }
}

/// Extract and flatten on the blocking pool, one bundle write at a time
async fn deploy(state: &AppState, folder: &str, archive: Bytes) -> Result<PathBuf, LoaderError> {
    let upload_dir = state.upload_dir.clone();
    let folder = folder.to_string();
    let flatten = state.config.bundles.flatten_uploads;
    let _guard = state.bundle_writes.lock().await;
    tokio::task::spawn_blocking(move || {
        upload::deploy_archive(&upload_dir, &folder, &archive, flatten)
    })
    .await
    .map_err(|e| LoaderError::UploadFailed(format!("upload task failed: {e}")))?
}

async fn remove_folder(state: &AppState, folder: String) -> Result<(), LoaderError> {
    let upload_dir = state.upload_dir.clone();
    let _guard = state.bundle_writes.lock().await;
    tokio::task::spawn_blocking(move || upload::remove_bundle(&upload_dir, &folder))
        .await
        .map_err(|e| LoaderError::Store(format!("delete task failed: {e}")))?
}

fn loader_error(e: &LoaderError) -> Response<Full<Bytes>> {
    let status = match e {
        LoaderError::UploadFailed(_) => StatusCode::BAD_REQUEST,
        LoaderError::NotFound(_) => StatusCode::NOT_FOUND,
        LoaderError::Forbidden(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    logger::log_error(&format!("Admin operation failed: {e}"));
    error(status, &e.to_string())
}
