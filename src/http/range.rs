//! HTTP Range request parsing module
//!
//! Single `bytes=` ranges (RFC 7233). Multi-range requests are answered with
//! the full body.

/// Inclusive byte range resolved against a known body length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn content_length(self) -> usize {
        self.end - self.start + 1
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Satisfiable range
    Valid(ByteRange),
    /// Should be answered with 416
    NotSatisfiable,
    /// No Range header or malformed: serve the full body
    None,
}

/// Parse an HTTP Range header
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
///
/// # Examples
/// ```
/// use spa_asset_server::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert_eq!(result, RangeParseResult::Valid(ByteRange { start: 0, end: 99 }));
///
/// assert_eq!(parse_range_header(None, 1000), RangeParseResult::None);
/// ```
pub fn parse_range_header(range_header: Option<&str>, body_len: usize) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };
    if spec.contains(',') {
        return RangeParseResult::None;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // Suffix range: "-500" means the last 500 bytes
        return match last.parse::<usize>() {
            Ok(0) => RangeParseResult::NotSatisfiable,
            Ok(_) if body_len == 0 => RangeParseResult::NotSatisfiable,
            Ok(suffix) => RangeParseResult::Valid(ByteRange {
                start: body_len.saturating_sub(suffix),
                end: body_len - 1,
            }),
            Err(_) => RangeParseResult::None,
        };
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if start >= body_len {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if last.is_empty() {
        body_len - 1
    } else {
        match last.parse::<usize>() {
            Ok(end) if end < start => return RangeParseResult::NotSatisfiable,
            Ok(end) => end.min(body_len - 1),
            Err(_) => return RangeParseResult::None,
        }
    };

    RangeParseResult::Valid(ByteRange { start, end })
}
