//! Environment layering. Kept in its own test binary since it mutates the
//! process environment.

use spa_asset_server::config::{Config, ManifestMode};

#[test]
fn test_env_overrides_defaults() {
    std::env::set_var("SPA_SERVER__PORT", "9000");
    std::env::set_var("SPA_HTTP__SERVER_NAME", "edge");
    std::env::set_var("SPA_ASSETS__MODE", "disk");

    let cfg = Config::load_from("spa-env-test-no-config-file").unwrap();
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.http.server_name, "edge");
    assert_eq!(cfg.assets.mode, ManifestMode::Disk);
    assert_eq!(cfg.server.host, "127.0.0.1");

    std::env::remove_var("SPA_SERVER__PORT");
    std::env::remove_var("SPA_HTTP__SERVER_NAME");
    std::env::remove_var("SPA_ASSETS__MODE");
}
