// API response utility functions module

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::types::{Notice, NoticeStatus};

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string_pretty(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(
                    r#"{"status":"error","message":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Success notice carrying extra fields
pub fn ok_with<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response<Full<Bytes>> {
    json_response(
        status,
        &Notice {
            status: NoticeStatus::Ok,
            message: message.to_string(),
            data: Some(data),
        },
    )
}

/// Plain success notice
pub fn ok(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &Notice::<()> {
            status: NoticeStatus::Ok,
            message: message.to_string(),
            data: None,
        },
    )
}

/// Error notice with the given status code
pub fn error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &Notice::<()> {
            status: NoticeStatus::Error,
            message: message.to_string(),
            data: None,
        },
    )
}

/// 404 Not Found response
pub fn not_found() -> Response<Full<Bytes>> {
    error(
        StatusCode::NOT_FOUND,
        "Not Found. Endpoints: /v1/health, /v1/pages, /v1/pages/{slug}, /v1/post-template, /v1/post-template/enabled",
    )
}

/// 401 response asking for a bearer token
pub fn unauthorized() -> Response<Full<Bytes>> {
    let mut resp = error(StatusCode::UNAUTHORIZED, "Missing or invalid admin token");
    resp.headers_mut().insert(
        hyper::header::WWW_AUTHENTICATE,
        hyper::header::HeaderValue::from_static("Bearer"),
    );
    resp
}
