//! HTTP response building module
//!
//! Builders for every status the server emits. Builder failures are logged and
//! degrade to an empty response rather than panicking.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use tracing::error;

use super::cache::CachePolicy;
use super::range::ByteRange;

pub type HttpResponse = Response<Full<Bytes>>;

const ALLOW: &str = "GET, HEAD, OPTIONS";

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, cache: CachePolicy) -> HttpResponse {
    finish(
        Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header("ETag", etag)
            .header("Cache-Control", cache.to_header_value()),
        Bytes::new(),
    )
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> HttpResponse {
    finish(
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header("Content-Type", "text/plain")
            .header("Allow", ALLOW),
        Bytes::from_static(b"405 Method Not Allowed"),
    )
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> HttpResponse {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(body_len: usize) -> HttpResponse {
    finish(
        Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header("Content-Type", "text/plain")
            .header("Content-Range", format!("bytes */{body_len}")),
        Bytes::from_static(b"416 Range Not Satisfiable"),
    )
}

/// Build 503 Service Unavailable response
pub fn build_503_response() -> HttpResponse {
    build_text_response(StatusCode::SERVICE_UNAVAILABLE, "503 Service Unavailable")
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", ALLOW);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", ALLOW)
            .header("Access-Control-Allow-Headers", "Content-Type, Range")
            .header("Access-Control-Max-Age", "86400");
    }

    finish(builder, Bytes::new())
}

/// Build health probe response
pub fn build_health_response(status: &str, is_head: bool) -> HttpResponse {
    let body = serde_json::json!({ "status": status }).to_string();
    let content_length = body.len();
    finish(
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Content-Length", content_length)
            .header("Cache-Control", CachePolicy::NoStore.to_header_value()),
        if is_head { Bytes::new() } else { Bytes::from(body) },
    )
}

/// Build 200 response for a full body
pub fn build_ok_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    cache: CachePolicy,
    accept_ranges: bool,
    is_head: bool,
) -> HttpResponse {
    let content_length = data.len();
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length);
    if accept_ranges {
        builder = builder.header("Accept-Ranges", "bytes");
    }
    finish(
        builder
            .header("ETag", etag)
            .header("Cache-Control", cache.to_header_value()),
        if is_head { Bytes::new() } else { data },
    )
}

/// Build 206 Partial Content response from the full body
pub fn build_partial_response(
    data: &Bytes,
    range: ByteRange,
    content_type: &str,
    etag: &str,
    cache: CachePolicy,
    is_head: bool,
) -> HttpResponse {
    let total = data.len();
    let body = if is_head {
        Bytes::new()
    } else {
        data.slice(range.start..=range.end)
    };
    finish(
        Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header("Content-Type", content_type)
            .header("Content-Length", range.content_length())
            .header(
                "Content-Range",
                format!("bytes {}-{}/{total}", range.start, range.end),
            )
            .header("Accept-Ranges", "bytes")
            .header("ETag", etag)
            .header("Cache-Control", cache.to_header_value()),
        body,
    )
}

fn build_text_response(status: StatusCode, text: &'static str) -> HttpResponse {
    finish(
        Response::builder()
            .status(status)
            .header("Content-Type", "text/plain"),
        Bytes::from_static(text.as_bytes()),
    )
}

fn finish(builder: Builder, body: Bytes) -> HttpResponse {
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        error!(error = %e, "failed to build response");
        Response::new(Full::new(Bytes::new()))
    })
}
