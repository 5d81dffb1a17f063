// Configuration module entry point
// Loads layered configuration (defaults, TOML file, environment) and holds runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ConfigError;
use crate::router::FallbackPolicy;

// Re-export public types
pub use state::AppState;
pub use types::{
    AssetsConfig, Config, HealthConfig, HttpConfig, LoggingConfig, ManifestMode,
    PerformanceConfig, ServerConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// A missing file is not an error: defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SPA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_grace", 10)?
            .set_default("http.server_name", "spa-asset-server")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB, nothing here accepts uploads
            .set_default("assets.root", "dist")?
            .set_default("assets.mode", "preload")?
            .set_default("assets.fallback_document", "/index.html")?
            .set_default("assets.reserved_prefixes", vec!["/_next/"])?
            .set_default("assets.index_files", vec!["index.html"])?
            .set_default("assets.max_age", 3600)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the router cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.assets.fallback_document.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "assets.fallback_document must be an absolute URL path, got '{}'",
                self.assets.fallback_document
            )));
        }
        if let Some(prefix) = self
            .assets
            .reserved_prefixes
            .iter()
            .find(|p| !p.starts_with('/'))
        {
            return Err(ConfigError::Invalid(format!(
                "assets.reserved_prefixes entries must start with '/', got '{prefix}'"
            )));
        }
        if self.assets.index_files.iter().any(|f| f.contains('/')) {
            return Err(ConfigError::Invalid(
                "assets.index_files must be bare file names".to_string(),
            ));
        }
        if self.performance.read_timeout == 0 && self.performance.write_timeout == 0 {
            return Err(ConfigError::Invalid(
                "performance.read_timeout and performance.write_timeout cannot both be 0"
                    .to_string(),
            ));
        }
        self.get_socket_addr().map(|_| ())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ConfigError::Address { addr, source })
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy::new(
            &self.assets.fallback_document,
            self.assets.reserved_prefixes.as_slice(),
        )
    }
}
