// Application state module
// Holds the loaded configuration and the currently active asset router

use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::Config;
use crate::router::AssetRouter;

/// Application state shared by every connection
pub struct AppState {
    pub config: Config,
    router: RwLock<Arc<AssetRouter>>,
}

impl AppState {
    pub fn new(config: Config, router: AssetRouter) -> Self {
        Self {
            config,
            router: RwLock::new(Arc::new(router)),
        }
    }

    /// Snapshot of the active router; the lock is released before returning
    pub async fn router(&self) -> Arc<AssetRouter> {
        Arc::clone(&*self.router.read().await)
    }

    /// Swap in a freshly built router (manifest reload)
    pub async fn replace_router(&self, router: AssetRouter) {
        *self.router.write().await = Arc::new(router);
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
