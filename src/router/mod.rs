//! Asset request router
//!
//! Per-request decision between serving an asset verbatim, substituting the
//! fallback entry document, or passing the not-found result through.
//!
//! Resolution order:
//! 1. Exact lookup of the request path
//! 2. On a miss, if [`FallbackPolicy::is_eligible`], a second lookup of the
//!    fallback document
//! 3. A fault from the primary lookup is caught in [`AssetRouter::route`] and
//!    answered with the fallback document
//!
//! At most two lookups happen per request.

mod policy;

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::LookupFault;
use crate::manifest::{Asset, AssetManifest, Lookup};

pub use policy::{has_extension, FallbackPolicy};

/// Outcome of routing one request
#[derive(Debug)]
pub enum Resolution {
    /// The requested path itself
    Asset(Asset),
    /// The fallback document stood in for the requested path
    Fallback(Asset),
    /// Nothing to serve
    NotFound,
    /// The fallback lookup faulted and no lookups remain
    Unavailable(LookupFault),
}

/// Resolution plus the number of manifest lookups it took
#[derive(Debug)]
pub struct Routed {
    pub resolution: Resolution,
    pub lookups: u8,
}

/// Per-request decision over a shared manifest and fallback policy
pub struct AssetRouter {
    manifest: Arc<dyn AssetManifest>,
    policy: FallbackPolicy,
}

impl AssetRouter {
    pub fn new(manifest: Arc<dyn AssetManifest>, policy: FallbackPolicy) -> Self {
        Self { manifest, policy }
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn manifest(&self) -> &dyn AssetManifest {
        self.manifest.as_ref()
    }

    /// Route a request path. Always produces a resolution.
    pub async fn route(&self, path: &str) -> Routed {
        let mut lookups = 0;
        match self.resolve(path, &mut lookups).await {
            Ok(resolution) => Routed {
                resolution,
                lookups,
            },
            Err(fault) if lookups < 2 => {
                warn!(path, error = %fault, "asset lookup failed, serving fallback document");
                let resolution = match self.lookup(self.policy.document(), &mut lookups).await {
                    Ok(Lookup::Found(asset)) => Resolution::Fallback(asset),
                    Ok(Lookup::NotFound) => Resolution::NotFound,
                    Err(fault) => Resolution::Unavailable(fault),
                };
                Routed {
                    resolution,
                    lookups,
                }
            }
            Err(fault) => {
                warn!(path, error = %fault, "fallback document lookup failed");
                Routed {
                    resolution: Resolution::Unavailable(fault),
                    lookups,
                }
            }
        }
    }

    /// Fault-free path; any fault propagates to the boundary in `route`
    async fn resolve(&self, path: &str, lookups: &mut u8) -> Result<Resolution, LookupFault> {
        match self.lookup(path, lookups).await? {
            Lookup::Found(asset) => Ok(Resolution::Asset(asset)),
            Lookup::NotFound if self.policy.is_eligible(path) => {
                debug!(path, fallback = self.policy.document(), "substituting fallback document");
                match self.lookup(self.policy.document(), lookups).await? {
                    Lookup::Found(asset) => Ok(Resolution::Fallback(asset)),
                    Lookup::NotFound => Ok(Resolution::NotFound),
                }
            }
            Lookup::NotFound => Ok(Resolution::NotFound),
        }
    }

    async fn lookup(&self, path: &str, lookups: &mut u8) -> Result<Lookup, LookupFault> {
        *lookups += 1;
        self.manifest.fetch(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MemoryManifest;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    const INDEX_HTML: &str = "<!doctype html><div id=root></div>";

    /// Memory manifest that faults for selected paths and records every call
    struct ScriptedManifest {
        inner: MemoryManifest,
        faulty: HashSet<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedManifest {
        fn new(faulty: &[&'static str]) -> Self {
            let inner = MemoryManifest::from_entries(
                [
                    ("/index.html", Asset::new(INDEX_HTML, "text/html")),
                    ("/app.js", Asset::new("boot()", "application/javascript")),
                    (
                        "/_next/static/present.js",
                        Asset::new("present", "application/javascript"),
                    ),
                ],
                Vec::new(),
            );
            Self {
                inner,
                faulty: faulty.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AssetManifest for ScriptedManifest {
        async fn fetch(&self, path: &str) -> Result<Lookup, LookupFault> {
            self.calls.lock().unwrap().push(path.to_string());
            if self.faulty.contains(path) {
                return Err(LookupFault::Backend(format!("injected fault for {path}")));
            }
            self.inner.fetch(path).await
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn router(manifest: &Arc<ScriptedManifest>) -> AssetRouter {
        AssetRouter::new(
            Arc::clone(manifest) as Arc<dyn AssetManifest>,
            FallbackPolicy::new("/index.html", &["/_next/"]),
        )
    }

    fn expect_fallback(routed: &Routed) {
        match &routed.resolution {
            Resolution::Fallback(asset) => {
                assert_eq!(asset.body.as_ref(), INDEX_HTML.as_bytes());
                assert_eq!(asset.content_type, "text/html");
            }
            other => panic!("Expected Fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_present_asset_served_verbatim() {
        let manifest = Arc::new(ScriptedManifest::new(&[]));
        let routed = router(&manifest).route("/index.html").await;
        match routed.resolution {
            Resolution::Asset(asset) => {
                assert_eq!(asset.body.as_ref(), INDEX_HTML.as_bytes());
                assert_eq!(asset.content_type, "text/html");
            }
            other => panic!("Expected Asset, got {other:?}"),
        }
        assert_eq!(routed.lookups, 1);
        assert_eq!(manifest.calls(), vec!["/index.html"]);
    }

    #[tokio::test]
    async fn test_client_route_gets_fallback() {
        let manifest = Arc::new(ScriptedManifest::new(&[]));
        let routed = router(&manifest).route("/about").await;
        expect_fallback(&routed);
        assert_eq!(routed.lookups, 2);
        assert_eq!(manifest.calls(), vec!["/about", "/index.html"]);
    }

    #[tokio::test]
    async fn test_missing_file_like_path_is_not_found() {
        let manifest = Arc::new(ScriptedManifest::new(&[]));
        let routed = router(&manifest).route("/logo.png").await;
        assert!(matches!(routed.resolution, Resolution::NotFound));
        assert_eq!(routed.lookups, 1);
    }

    #[tokio::test]
    async fn test_reserved_prefix_is_not_found() {
        let manifest = Arc::new(ScriptedManifest::new(&[]));
        let r = router(&manifest);

        let routed = r.route("/_next/static/chunk.js").await;
        assert!(matches!(routed.resolution, Resolution::NotFound));
        assert_eq!(routed.lookups, 1);

        // Extension-less paths under the prefix get no fallback either
        let routed = r.route("/_next/data/page").await;
        assert!(matches!(routed.resolution, Resolution::NotFound));
        assert_eq!(routed.lookups, 1);
    }

    #[tokio::test]
    async fn test_reserved_prefix_asset_still_served() {
        let manifest = Arc::new(ScriptedManifest::new(&[]));
        let routed = router(&manifest).route("/_next/static/present.js").await;
        assert!(matches!(routed.resolution, Resolution::Asset(_)));
    }

    #[tokio::test]
    async fn test_primary_fault_recovers_to_fallback() {
        let faulty = ["/dashboard", "/logo.png", "/_next/static/chunk.js", "/app.js"];
        for path in faulty {
            let manifest = Arc::new(ScriptedManifest::new(&faulty));
            let routed = router(&manifest).route(path).await;
            expect_fallback(&routed);
            assert_eq!(routed.lookups, 2, "path {path}");
            assert_eq!(manifest.calls(), vec![path, "/index.html"]);
        }
    }

    #[tokio::test]
    async fn test_fallback_fault_is_unavailable() {
        let manifest = Arc::new(ScriptedManifest::new(&["/index.html"]));
        let routed = router(&manifest).route("/about").await;
        assert!(matches!(routed.resolution, Resolution::Unavailable(_)));
        assert_eq!(routed.lookups, 2);
    }

    #[tokio::test]
    async fn test_every_lookup_faulting_stays_within_two_calls() {
        let manifest = Arc::new(ScriptedManifest::new(&["/dashboard", "/index.html"]));
        let routed = router(&manifest).route("/dashboard").await;
        assert!(matches!(routed.resolution, Resolution::Unavailable(_)));
        assert_eq!(routed.lookups, 2);
        assert_eq!(manifest.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_fallback_document_is_not_found() {
        let manifest: Arc<dyn AssetManifest> =
            Arc::new(MemoryManifest::from_entries(Vec::<(String, Asset)>::new(), Vec::new()));
        let r = AssetRouter::new(manifest, FallbackPolicy::new("/index.html", &["/_next/"]));
        let routed = r.route("/about").await;
        assert!(matches!(routed.resolution, Resolution::NotFound));
        assert_eq!(routed.lookups, 2);
    }
}
