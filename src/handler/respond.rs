//! Router decision to HTTP response
//!
//! Assets are served with `ETag`, `Range` and a public cache lifetime. The
//! fallback document is always revalidated so client-side routes pick up a
//! fresh entry point after a deploy.

use tracing::error;

use super::RequestContext;
use crate::http::{self, cache::CachePolicy, range::RangeParseResult, HttpResponse};
use crate::logger::Served;
use crate::manifest::Asset;
use crate::router::Resolution;

/// Turn a resolution into a response
pub fn respond(
    ctx: &RequestContext<'_>,
    resolution: Resolution,
    max_age: u32,
) -> (HttpResponse, Served) {
    match resolution {
        Resolution::Asset(asset) => (
            serve_asset(ctx, &asset, CachePolicy::Public(max_age), true),
            Served::Asset,
        ),
        Resolution::Fallback(asset) => (
            serve_asset(ctx, &asset, CachePolicy::NoCache, false),
            Served::Fallback,
        ),
        Resolution::NotFound => (http::build_404_response(), Served::NotFound),
        Resolution::Unavailable(fault) => {
            error!(path = ctx.path, error = %fault, "no fallback document available");
            (http::build_503_response(), Served::Unavailable)
        }
    }
}

fn serve_asset(
    ctx: &RequestContext<'_>,
    asset: &Asset,
    cache: CachePolicy,
    allow_range: bool,
) -> HttpResponse {
    if http::cache::check_etag_match(ctx.if_none_match, &asset.etag) {
        return http::build_304_response(&asset.etag, cache);
    }

    if allow_range {
        match http::parse_range_header(ctx.range_header, asset.body.len()) {
            RangeParseResult::Valid(range) => {
                return http::response::build_partial_response(
                    &asset.body,
                    range,
                    &asset.content_type,
                    &asset.etag,
                    cache,
                    ctx.is_head,
                );
            }
            RangeParseResult::NotSatisfiable => {
                return http::build_416_response(asset.body.len());
            }
            RangeParseResult::None => {}
        }
    }

    http::response::build_ok_response(
        asset.body.clone(),
        &asset.content_type,
        &asset.etag,
        cache,
        allow_range,
        ctx.is_head,
    )
}
