//! In-memory manifest
//!
//! Built once by walking the build-output directory; lookups never fault.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{Asset, AssetManifest, Lookup};
use crate::error::{LookupFault, ManifestError};

#[derive(Debug, Default)]
pub struct MemoryManifest {
    assets: HashMap<String, Asset>,
    index_files: Vec<String>,
    total_bytes: usize,
}

impl MemoryManifest {
    pub fn new(index_files: Vec<String>) -> Self {
        Self {
            assets: HashMap::new(),
            index_files,
            total_bytes: 0,
        }
    }

    /// Build from `(path, asset)` pairs
    pub fn from_entries<I, K>(entries: I, index_files: Vec<String>) -> Self
    where
        I: IntoIterator<Item = (K, Asset)>,
        K: Into<String>,
    {
        let mut manifest = Self::new(index_files);
        for (path, asset) in entries {
            manifest.insert(path, asset);
        }
        manifest
    }

    /// Walk `root` recursively and load every file
    pub fn from_dir(root: &Path, index_files: &[String]) -> Result<Self, ManifestError> {
        if !root.is_dir() {
            return Err(ManifestError::MissingRoot(root.to_path_buf()));
        }

        let root_canonical = fs::canonicalize(root).map_err(|source| ManifestError::Scan {
            path: root.to_path_buf(),
            source,
        })?;

        let mut manifest = Self::new(index_files.to_vec());
        let mut pending: Vec<(PathBuf, PathBuf, String)> =
            vec![(root.to_path_buf(), root_canonical.clone(), String::new())];

        while let Some((dir, dir_canonical, prefix)) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|source| ManifestError::Scan {
                path: dir.clone(),
                source,
            })?;

            for entry in entries {
                let entry = entry.map_err(|source| ManifestError::Scan {
                    path: dir.clone(),
                    source,
                })?;
                let path = entry.path();
                let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
                    warn!(path = %path.display(), "skipping asset with non UTF-8 name");
                    continue;
                };
                let url_path = format!("{prefix}/{name}");

                // Symlinks are followed, but only to targets inside the root
                let canonical = match fs::canonicalize(&path) {
                    Ok(p) => p,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        warn!(path = %path.display(), "skipping dangling symlink");
                        continue;
                    }
                    Err(source) => return Err(ManifestError::Scan { path, source }),
                };
                if !canonical.starts_with(&root_canonical) {
                    warn!(
                        path = %url_path,
                        resolved = %canonical.display(),
                        "skipping asset outside the root"
                    );
                    continue;
                }

                let metadata = fs::metadata(&canonical).map_err(|source| ManifestError::Scan {
                    path: path.clone(),
                    source,
                })?;
                if metadata.is_dir() {
                    // A link back to an ancestor would never terminate
                    if dir_canonical.starts_with(&canonical) {
                        warn!(path = %url_path, "skipping symlink cycle");
                        continue;
                    }
                    pending.push((path, canonical, url_path));
                } else if metadata.is_file() {
                    let body = fs::read(&path).map_err(|source| ManifestError::Scan {
                        path: path.clone(),
                        source,
                    })?;
                    debug!(path = %url_path, bytes = body.len(), "manifest entry");
                    manifest.insert(url_path, Asset::from_path(&path, body));
                }
            }
        }

        Ok(manifest)
    }

    pub fn insert(&mut self, path: impl Into<String>, asset: Asset) {
        self.total_bytes += asset.body.len();
        if let Some(old) = self.assets.insert(path.into(), asset) {
            self.total_bytes -= old.body.len();
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn resolve(&self, path: &str) -> Option<&Asset> {
        if let Some(asset) = self.assets.get(path) {
            return Some(asset);
        }

        // Directory-like paths resolve to an index file
        let dir = path.trim_end_matches('/');
        self.index_files
            .iter()
            .find_map(|index| self.assets.get(&format!("{dir}/{index}")))
    }
}

#[async_trait]
impl AssetManifest for MemoryManifest {
    async fn fetch(&self, path: &str) -> Result<Lookup, LookupFault> {
        Ok(self
            .resolve(path)
            .map_or(Lookup::NotFound, |asset| Lookup::Found(asset.clone())))
    }

    fn describe(&self) -> String {
        format!(
            "in-memory manifest ({} assets, {} bytes)",
            self.assets.len(),
            self.total_bytes
        )
    }
}
