//! Disk-backed manifest
//!
//! Resolves each lookup against the build-output directory. Missing files are
//! `NotFound`; any other I/O failure is a `LookupFault`.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

use super::{Asset, AssetManifest, Lookup};
use crate::error::{LookupFault, ManifestError};

#[derive(Debug, Clone)]
pub struct DirectoryManifest {
    root: PathBuf,
    index_files: Vec<String>,
}

impl DirectoryManifest {
    pub fn new(root: &Path, index_files: Vec<String>) -> Result<Self, ManifestError> {
        if !root.is_dir() {
            return Err(ManifestError::MissingRoot(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            index_files,
        })
    }

    async fn locate(&self, path: &str) -> Result<Option<PathBuf>, LookupFault> {
        // Parent segments never resolve; `..` inside a file name is fine
        if path.split('/').any(|segment| segment == "..") {
            warn!(path, "path traversal attempt blocked");
            return Ok(None);
        }
        let relative_path = path.trim_start_matches('/');

        let root_canonical =
            fs::canonicalize(&self.root)
                .await
                .map_err(|source| LookupFault::RootUnavailable {
                    root: self.root.clone(),
                    source,
                })?;

        let mut file_path = self.root.join(relative_path);

        // Directory-like paths resolve to an index file
        let is_dir = fs::metadata(&file_path).await.is_ok_and(|m| m.is_dir());
        if is_dir || relative_path.is_empty() || relative_path.ends_with('/') {
            for index_file in &self.index_files {
                let index_path = file_path.join(index_file);
                if fs::metadata(&index_path).await.is_ok_and(|m| m.is_file()) {
                    file_path = index_path;
                    break;
                }
            }
        }

        let canonical = match fs::canonicalize(&file_path).await {
            Ok(p) => p,
            Err(e) if is_missing(&e) => return Ok(None),
            Err(source) => {
                return Err(LookupFault::Read {
                    path: file_path,
                    source,
                })
            }
        };

        if !canonical.starts_with(&root_canonical) {
            warn!(
                path,
                resolved = %canonical.display(),
                "path traversal attempt blocked"
            );
            return Ok(None);
        }
        if fs::metadata(&canonical).await.is_ok_and(|m| m.is_dir()) {
            return Ok(None);
        }

        Ok(Some(canonical))
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[async_trait]
impl AssetManifest for DirectoryManifest {
    async fn fetch(&self, path: &str) -> Result<Lookup, LookupFault> {
        let Some(file_path) = self.locate(path).await? else {
            return Ok(Lookup::NotFound);
        };

        match fs::read(&file_path).await {
            Ok(content) => Ok(Lookup::Found(Asset::from_path(&file_path, content))),
            // Removed between resolution and read
            Err(e) if is_missing(&e) => Ok(Lookup::NotFound),
            Err(source) => Err(LookupFault::Read {
                path: file_path,
                source,
            }),
        }
    }

    fn describe(&self) -> String {
        format!("disk manifest rooted at {}", self.root.display())
    }
}
