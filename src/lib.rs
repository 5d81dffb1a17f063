//! Static asset server for single-page applications.
//!
//! Requests are resolved against an [`manifest::AssetManifest`]; paths that do
//! not name an asset fall back to the application entry document unless they
//! look like a file or sit under a reserved prefix.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod manifest;
pub mod router;
pub mod server;
