/*****************************************************************************************
 *
 *  Stockroom – snapshot server for remote inventory storage
 *  --------------------------------------------------------
 *
 *  Serves PUT/GET/DELETE /inventory/{key} over a configured storage adapter.
 *
 *****************************************************************************************/

use std::path::PathBuf;

use axum::serve;
use tokio::net::TcpListener;

use tracing_subscriber::FmtSubscriber;

use stockroom::app;
use stockroom::config::AppConfig;

#[tokio::main]
async fn main() {
    //
    // ────────────────────────────────────────────────────────
    //  Locate config.json (EXE folder or project root)
    // ────────────────────────────────────────────────────────
    //
    let exe_path = std::env::current_exe().expect("Cannot get executable path");
    let exe_dir = exe_path.parent().expect("Cannot get executable directory");

    let mut config_path: PathBuf = exe_dir.join("config.json");

    if !config_path.exists() {
        let fallback = exe_dir.join("..").join("config.json");
        if fallback.exists() {
            config_path = fallback;
        } else {
            panic!(
                "config.json not found in:\n  {}\n  {}\nCopy config.json to one of these paths.",
                exe_dir.join("config.json").display(),
                fallback.display()
            );
        }
    }

    //
    // ────────────────────────────────────────────────────────
    //  Load configuration
    // ────────────────────────────────────────────────────────
    //
    let cfg = AppConfig::load_from_file(&config_path).expect("Invalid config.json");

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cfg.level_filter())
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    tracing::info!("Loaded config.json from {}", config_path.display());
    tracing::info!("Starting stockroom snapshot server…");
    tracing::info!("Loaded configuration: {:?}", cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Build storage backend
    // ────────────────────────────────────────────────────────
    //
    let adapter = cfg
        .storage
        .build()
        .expect("Failed to build storage adapter");
    tracing::info!("Using {} storage", cfg.storage.kind());

    let app = app::build_app(adapter, cfg.clone());

    //
    // ────────────────────────────────────────────────────────
    //  Bind server and start listening
    // ────────────────────────────────────────────────────────
    //
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Listening on http://{}", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .await
        .expect("Server error");
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");

    tracing::warn!("CTRL+C received — shutting down");
}
