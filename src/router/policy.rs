//! Fallback eligibility
//!
//! Decides, from the path alone, whether a missing asset may be replaced by
//! the fallback entry document.

/// Fallback document plus the build-output namespaces that never receive it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    document: String,
    /// Normalized to end with `/`
    reserved_prefixes: Vec<String>,
}

impl FallbackPolicy {
    pub fn new<S: AsRef<str>>(document: &str, reserved_prefixes: &[S]) -> Self {
        let reserved_prefixes = reserved_prefixes
            .iter()
            .map(|p| AsRef::<str>::as_ref(p))
            .filter(|p| !p.trim_matches('/').is_empty())
            .map(|p| format!("{}/", p.trim_end_matches('/')))
            .collect();
        Self {
            document: document.to_string(),
            reserved_prefixes,
        }
    }

    /// Path of the fallback entry document
    pub fn document(&self) -> &str {
        &self.document
    }

    /// True when a missing `path` should be answered with the fallback document
    pub fn is_eligible(&self, path: &str) -> bool {
        !has_extension(path) && !self.is_reserved(path)
    }

    /// True when `path` lies under a reserved build-output prefix
    pub fn is_reserved(&self, path: &str) -> bool {
        self.reserved_prefixes.iter().any(|prefix| {
            path.starts_with(prefix.as_str()) || path == prefix.trim_end_matches('/')
        })
    }
}

/// A `.` in the final path segment marks a file-like request
pub fn has_extension(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FallbackPolicy {
        FallbackPolicy::new("/index.html", &["/_next/"])
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("/logo.png"));
        assert!(has_extension("/a/b/c.min.js"));
        assert!(has_extension("/.well-known"));
        assert!(!has_extension("/about"));
        assert!(!has_extension("/"));
        assert!(!has_extension("/v1.2/settings"));
        assert!(!has_extension("/docs/"));
    }

    #[test]
    fn test_reserved_prefix() {
        let p = policy();
        assert!(p.is_reserved("/_next/static/chunk.js"));
        assert!(p.is_reserved("/_next/data"));
        assert!(p.is_reserved("/_next"));
        assert!(!p.is_reserved("/_nextgen/page"));
        assert!(!p.is_reserved("/about"));
    }

    #[test]
    fn test_prefix_normalization() {
        let p = FallbackPolicy::new("/index.html", &["/assets", "/", ""]);
        assert!(p.is_reserved("/assets/app"));
        assert!(!p.is_reserved("/assetsx"));
        // A bare "/" would swallow every path and is ignored
        assert!(!p.is_reserved("/about"));
    }

    #[test]
    fn test_eligibility() {
        let p = policy();
        assert!(p.is_eligible("/about"));
        assert!(p.is_eligible("/users/42/settings"));
        assert!(!p.is_eligible("/logo.png"));
        assert!(!p.is_eligible("/_next/static/page"));
        assert!(!p.is_eligible("/index.html"));
    }
}
