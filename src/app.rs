use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::persistence::SharedAdapter;
use crate::routes::{inventory_routes, system_routes};

/// Build the snapshot server:
/// - /inventory  (remote adapter wire contract)
/// - /system     (alive + version)
///
/// `adapter` holds the snapshots clients push and pull.
pub fn build_app(adapter: SharedAdapter, cfg: AppConfig) -> Router {
    Router::new()
        // /inventory/*
        .nest("/inventory", inventory_routes::routes(adapter))

        // /system/*
        .nest("/system", system_routes::routes(cfg))

        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
