//! Request handler module
//!
//! Entry point for HTTP request processing: method and body-size checks,
//! health probes, then the asset router.

mod respond;

pub use respond::respond;

use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::AppState;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry, Served};

/// Request descriptor handed to response building
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub range_header: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self {
            path: req.uri().path(),
            is_head: req.method() == Method::HEAD,
            if_none_match: header_str(req, "if-none-match"),
            range_header: header_str(req, "range"),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();

    if state.config.logging.show_headers {
        debug!(count = req.headers().len(), headers = ?req.headers(), "request headers");
    }

    let (mut response, served, lookups) = dispatch(&req, &state).await;

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if state.access_log_enabled() {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = version_label(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.referer = header_string(&req, "referer");
        entry.user_agent = header_string(&req, "user-agent");
        entry.served = served;
        entry.lookups = lookups;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B>(req: &Request<B>, state: &AppState) -> (HttpResponse, Served, u8) {
    // 1. Check HTTP method
    match *req.method() {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS => {
            return (
                http::build_options_response(state.config.http.enable_cors),
                Served::Direct,
                0,
            );
        }
        _ => {
            warn!(method = %req.method(), path = req.uri().path(), "method not allowed");
            return (http::build_405_response(), Served::Direct, 0);
        }
    }

    // 2. Check body size
    if exceeds_body_limit(req, state.config.http.max_body_size) {
        return (http::build_413_response(), Served::Direct, 0);
    }

    let ctx = RequestContext::from_request(req);

    // 3. Health probes
    let health = &state.config.health;
    if health.enabled && (ctx.path == health.liveness_path || ctx.path == health.readiness_path) {
        return (
            http::build_health_response("ok", ctx.is_head),
            Served::Direct,
            0,
        );
    }

    // 4. Asset router
    let router = state.router().await;
    let routed = router.route(ctx.path).await;
    let (response, served) = respond(&ctx, routed.resolution, state.config.assets.max_age);
    (response, served, routed.lookups)
}

/// True when Content-Length is present and above the limit
fn exceeds_body_limit<B>(req: &Request<B>, max_body_size: u64) -> bool {
    let Some(value) = req.headers().get("content-length") else {
        return false;
    };
    match value.to_str().ok().and_then(|v| v.parse::<u64>().ok()) {
        Some(size) if size > max_body_size => {
            warn!(size, max_body_size, "request body too large");
            true
        }
        Some(_) => false,
        None => {
            warn!(value = ?value, "invalid Content-Length value, skipping size check");
            false
        }
    }
}

fn header_str<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    header_str(req, name).map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
