//! Asset manifest module
//!
//! The manifest is the lookup capability the router consults: a read-only
//! mapping from URL path to payload and content type, produced by the bundler.
//! Lookups complete with [`Lookup::Found`] or [`Lookup::NotFound`]; failures of
//! the capability itself travel on the error channel as [`LookupFault`].

mod directory;
mod memory;

use async_trait::async_trait;
use hyper::body::Bytes;
use std::path::Path;
use std::sync::Arc;

use crate::config::{AssetsConfig, ManifestMode};
use crate::error::{LookupFault, ManifestError};
use crate::http::{cache, mime};

pub use directory::DirectoryManifest;
pub use memory::MemoryManifest;

/// A servable payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub body: Bytes,
    pub content_type: String,
    pub etag: String,
}

impl Asset {
    pub fn new(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        let body = body.into();
        let etag = cache::generate_etag(&body);
        Self {
            body,
            content_type: content_type.into(),
            etag,
        }
    }

    /// Build an asset, deriving the content type from the path's extension
    pub fn from_path(path: &Path, body: impl Into<Bytes>) -> Self {
        let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
        Self::new(body, content_type)
    }
}

/// Completed lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Asset),
    NotFound,
}

/// Read-only lookup capability
#[async_trait]
pub trait AssetManifest: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Lookup, LookupFault>;

    /// Short description for startup logs
    fn describe(&self) -> String;
}

/// Build the manifest selected by configuration
pub fn build(assets: &AssetsConfig) -> Result<Arc<dyn AssetManifest>, ManifestError> {
    let root = Path::new(&assets.root);
    match assets.mode {
        ManifestMode::Preload => Ok(Arc::new(MemoryManifest::from_dir(
            root,
            &assets.index_files,
        )?)),
        ManifestMode::Disk => Ok(Arc::new(DirectoryManifest::new(
            root,
            assets.index_files.clone(),
        )?)),
    }
}
