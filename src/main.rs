use clap::Parser;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

use spa_asset_server::config::{AppState, Config};
use spa_asset_server::{logger, server};

/// Serve a single-page application build with client-side route fallback
#[derive(Debug, Parser)]
#[command(name = "spa-asset-server", version, about)]
struct Args {
    /// Configuration file path (extension optional)
    #[arg(short, long, default_value = "config")]
    config: String,

    /// Build-output directory, overrides `assets.root`
    #[arg(short, long)]
    root: Option<String>,

    /// Print the effective configuration and manifest summary, then exit
    #[arg(long)]
    check: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut cfg = Config::load_from(&args.config)?;
    if let Some(root) = args.root {
        cfg.assets.root = root;
    }

    if args.check {
        let router = server::build_router(&cfg)?;
        println!("{}", toml::to_string_pretty(&cfg)?);
        println!("# {}", router.manifest().describe());
        return Ok(());
    }

    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        info!(workers, "using configured worker threads");
    } else {
        info!("using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let router = server::build_router(&cfg)?;
    let listener = server::create_reusable_listener(addr)?;

    logger::log_server_start(&addr, &cfg, &router.manifest().describe());

    let state = Arc::new(AppState::new(cfg, router));
    let shutdown = Arc::new(Notify::new());

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async move {
            server::start_signal_handler(Arc::clone(&state), Arc::clone(&shutdown))?;
            server::serve(listener, state, shutdown).await
        })
        .await?;

    info!("server stopped");
    Ok(())
}
