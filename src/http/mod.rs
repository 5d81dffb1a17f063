//! HTTP protocol layer module
//!
//! Protocol helpers shared by the request handler: cache validators, content
//! types, byte ranges and response builders.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_416_response, build_503_response, build_health_response, build_options_response,
    HttpResponse,
};
