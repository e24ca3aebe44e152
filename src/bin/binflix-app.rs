use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use axum::response::Html;
use clap::Parser;
use tower_http::services::{ServeDir, ServeFile};

use binflix::app::favorites::{FavoritesStore, InMemoryFavorites};
use binflix::app::routes::{AppState, router};
use binflix::catalog::Catalog;
use binflix::config::{CatalogConfig, DEFAULT_FETCH_CONCURRENCY};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:5000")]
    addr: SocketAddr,

    /// Static web assets directory (serve if exists).
    #[arg(long, default_value = "web/dist")]
    web_dir: PathBuf,

    /// Maximum concurrent metadata requests while listing.
    #[arg(long, default_value_t = DEFAULT_FETCH_CONCURRENCY)]
    fetch_concurrency: usize,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    binflix::logging::init("info")?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting binflix-app");

    let config = CatalogConfig::from_env()
        .context("load configuration")?
        .with_fetch_concurrency(args.fetch_concurrency);
    tracing::info!(?config, "loaded configuration");

    let catalog = Arc::new(Catalog::from_config(&config).context("build catalog")?);
    let favorites: Arc<dyn FavoritesStore> = Arc::new(InMemoryFavorites::new());
    let mut app = router(AppState { catalog, favorites });

    let web_index = args.web_dir.join("index.html");
    if web_index.exists() {
        let static_files = ServeDir::new(&args.web_dir).not_found_service(ServeFile::new(web_index));
        app = app.fallback_service(static_files);
    } else {
        app = app.fallback(|| async {
            Html(
                r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>binflix</title></head>
  <body>
    <h1>binflix</h1>
    <p>web assets not found. Build the web app into <code>web/dist</code> or browse the JSON API under <code>/api</code>.</p>
  </body>
</html>
"#,
            )
        });
    }

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
