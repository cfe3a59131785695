//! Opinion pages — Axum web server.
//!
//! Serves the JSON API behind the market list, market detail, and opinion
//! feed pages, plus a self-contained HTML page. CORS enabled for local
//! development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    response::Html,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

pub use routes::{AppState, ServerState};

/// The embedded opinion page HTML (compiled into the binary).
const OPINION_HTML: &str = include_str!("templates/index.html");

/// Run the web server until shutdown is signalled.
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = build_router(state);

    let addr: std::net::SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address: {host}:{port}"))?;
    info!(%addr, "Opinion server starting on http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Opinion server error")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received.");
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // API routes
        .route("/opinion/feed", get(routes::get_feed))
        .route("/markets", get(routes::get_markets))
        .route("/markets/:topic_id", get(routes::get_market_detail))
        .route("/health", get(routes::health))
        // Opinion page HTML
        .route("/", get(serve_page))
        .layer(cors)
        .with_state(state)
}

/// Serve the embedded HTML page.
async fn serve_page() -> Html<&'static str> {
    Html(OPINION_HTML)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
