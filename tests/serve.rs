//! End-to-end tests: real listener, raw HTTP/1.1 over TCP.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;

use spa_asset_server::config::{AppState, Config, ManifestMode};
use spa_asset_server::server;

fn build_output(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("spa-serve-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&root);
    let _ = fs::remove_file(root.with_extension("secret"));
    fs::create_dir_all(root.join("_next/static")).unwrap();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::write(root.join("index.html"), "<html>app</html>").unwrap();
    fs::write(root.join("logo.svg"), "<svg/>").unwrap();
    fs::write(root.join("docs/index.html"), "<html>docs</html>").unwrap();
    fs::write(root.join("_next/static/app.js"), "console.log(1)").unwrap();
    fs::write(root.join("vendor..min.js"), "vendor").unwrap();
    #[cfg(unix)]
    {
        let outside = root.with_extension("secret");
        fs::write(&outside, "secret").unwrap();
        std::os::unix::fs::symlink(&outside, root.join("leak.txt")).unwrap();
    }
    root
}

fn config_for(root: &Path, mode: ManifestMode) -> Config {
    let mut config = Config::load_from("spa-serve-test-no-config-file").unwrap();
    config.assets.root = root.to_string_lossy().into_owned();
    config.assets.mode = mode;
    config.logging.access_log = false;
    config.performance.shutdown_grace = 1;
    config
}

struct Reply {
    status: u16,
    head: String,
    body: String,
}

async fn get(addr: SocketAddr, path: &str) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();
    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();
    Reply {
        status,
        head: head.to_ascii_lowercase(),
        body: body.to_string(),
    }
}

/// Run `scenario` against a live server, then shut it down.
async fn with_server<F, Fut>(config: Config, scenario: F)
where
    F: FnOnce(SocketAddr, Arc<AppState>) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let router = server::build_router(&config).unwrap();
    let listener = server::create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(config, router));
    let shutdown = Arc::new(Notify::new());

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let handle = tokio::task::spawn_local(server::serve(
                listener,
                Arc::clone(&state),
                Arc::clone(&shutdown),
            ));
            scenario(addr, Arc::clone(&state)).await;
            shutdown.notify_one();
            handle.await.unwrap().unwrap();
        })
        .await;
}

async fn assert_routing(addr: SocketAddr) {
    let reply = get(addr, "/logo.svg").await;
    assert_eq!(reply.status, 200);
    assert!(reply.head.contains("content-type: image/svg+xml"));
    assert_eq!(reply.body, "<svg/>");

    let reply = get(addr, "/settings/profile").await;
    assert_eq!(reply.status, 200);
    assert!(reply.head.contains("cache-control: no-cache"));
    assert_eq!(reply.body, "<html>app</html>");

    let reply = get(addr, "/docs/").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "<html>docs</html>");

    let reply = get(addr, "/_next/static/app.js").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "console.log(1)");

    let reply = get(addr, "/vendor..min.js").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "vendor");
    assert_eq!(get(addr, "/../index.html").await.status, 404);

    #[cfg(unix)]
    assert_eq!(get(addr, "/leak.txt").await.status, 404);

    assert_eq!(get(addr, "/missing.png").await.status, 404);
    assert_eq!(get(addr, "/_next/static/gone.js").await.status, 404);
    assert_eq!(get(addr, "/_next/data").await.status, 404);
    assert_eq!(get(addr, "/healthz").await.status, 200);
}

#[tokio::test]
async fn test_preloaded_manifest_routes() {
    let root = build_output("preload");
    with_server(config_for(&root, ManifestMode::Preload), |addr, _| {
        assert_routing(addr)
    })
    .await;
    let _ = fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_disk_manifest_routes() {
    let root = build_output("disk");
    with_server(config_for(&root, ManifestMode::Disk), |addr, _| {
        assert_routing(addr)
    })
    .await;
    let _ = fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_reload_picks_up_new_assets() {
    let root = build_output("reload");
    let new_file = root.join("robots.txt");
    with_server(
        config_for(&root, ManifestMode::Preload),
        |addr, state| async move {
            assert_eq!(get(addr, "/robots.txt").await.status, 404);

            fs::write(&new_file, "User-agent: *").unwrap();
            server::reload_router(&state).await.unwrap();

            let reply = get(addr, "/robots.txt").await;
            assert_eq!(reply.status, 200);
            assert_eq!(reply.body, "User-agent: *");
        },
    )
    .await;
    let _ = fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_disk_root_removed_serves_503() {
    let root = build_output("vanish");
    with_server(config_for(&root, ManifestMode::Disk), |addr, _| {
        let root = root.clone();
        async move {
            fs::remove_dir_all(&root).unwrap();
            assert_eq!(get(addr, "/settings").await.status, 503);
        }
    })
    .await;
}
