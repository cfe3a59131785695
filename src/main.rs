//! Opinion Hub — market and intelligence-feed pages with demo-data fallback.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! loads the topic catalog, wires the archive client (if enabled), and
//! serves the opinion pages with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use opinion_hub::archive::hub::HubClient;
use opinion_hub::archive::IntelligenceArchive;
use opinion_hub::catalog::TopicCatalog;
use opinion_hub::config;
use opinion_hub::feed::OpinionFeedService;
use opinion_hub::server::{self, ServerState};

const BANNER: &str = r#"
   ___        _       _               _   _       _
  / _ \ _ __ (_)_ __ (_) ___  _ __   | | | |_   _| |__
 | | | | '_ \| | '_ \| |/ _ \| '_ \  | |_| | | | | '_ \
 | |_| | |_) | | | | | | (_) | | | | |  _  | |_| | |_) |
  \___/| .__/|_|_| |_|_|\___/|_| |_| |_| |_|\__,_|_.__/
       |_|
  Opinion markets & intelligence feed
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        host = %cfg.server.host,
        port = cfg.server.port,
        archive_enabled = cfg.archive.enabled,
        "Opinion hub starting up"
    );

    // -- Topic catalog -----------------------------------------------------

    let catalog = TopicCatalog::load(&cfg.data.topics_path);
    info!(
        topics = catalog.len(),
        categories = catalog.categories().len(),
        "Topic catalog ready"
    );

    // -- Archive client ----------------------------------------------------

    let archive: Option<Arc<dyn IntelligenceArchive>> = if cfg.archive.enabled {
        let api_key = cfg
            .archive
            .api_key_env
            .as_deref()
            .and_then(|env| std::env::var(env).ok());
        if api_key.is_none() {
            info!("No archive API key set — querying public documents only");
        }
        let client = HubClient::new(
            cfg.archive.base_url.clone(),
            api_key,
            cfg.archive.timeout_secs,
        )?;
        info!(base_url = %cfg.archive.base_url, "Intelligence archive enabled");
        Some(Arc::new(client))
    } else {
        warn!("Intelligence archive disabled — serving bundled demo data only");
        None
    };

    // -- Service and server ------------------------------------------------

    let service = OpinionFeedService::new(archive, catalog, &cfg.data.demo_feed_path);
    let state = Arc::new(ServerState {
        service,
        default_limit: cfg.feed.default_limit,
        market_sample_limit: cfg.feed.market_sample_limit,
    });

    server::serve(state, &cfg.server.host, cfg.server.port).await?;

    info!("Opinion hub shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("opinion_hub=info"));

    let json_logging = std::env::var("OPINION_HUB_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
