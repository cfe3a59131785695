//! Opinion page route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ServerState>`.
//! The handlers never surface data-source failures: the feed service has
//! already degraded to demo data (or empty collections) by the time a
//! response is built.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::feed::OpinionFeedService;
use crate::types::{FeedItem, MarketCard, Topic};

/// Hard cap on per-request feed size, whatever the query string asks for.
const MAX_FEED_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServerState {
    pub service: OpinionFeedService,
    pub default_limit: usize,
    pub market_sample_limit: usize,
}

pub type AppState = Arc<ServerState>;

// ---------------------------------------------------------------------------
// Query and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct MarketsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    pub category: String,
    pub categories: Vec<String>,
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketsResponse {
    pub category: String,
    pub categories: Vec<String>,
    pub markets: Vec<MarketCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketDetailResponse {
    pub topic: Topic,
    pub recent_count: usize,
    pub feed: Vec<FeedItem>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /opinion/feed?category=&limit=
pub async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Json<FeedResponse> {
    let category = query.category.unwrap_or_else(|| "All".to_string());
    let limit = query
        .limit
        .unwrap_or(state.default_limit)
        .min(MAX_FEED_LIMIT);

    let items = state.service.feed(Some(&category), limit).await;

    Json(FeedResponse {
        categories: state.service.categories(),
        category,
        items,
    })
}

/// GET /markets?category=
pub async fn get_markets(
    State(state): State<AppState>,
    Query(query): Query<MarketsQuery>,
) -> Json<MarketsResponse> {
    let category = query.category.unwrap_or_else(|| "All".to_string());

    let markets = state
        .service
        .list_markets(Some(&category), state.market_sample_limit)
        .await;

    Json(MarketsResponse {
        categories: state.service.categories(),
        category,
        markets,
    })
}

/// GET /markets/:topic_id
pub async fn get_market_detail(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> Result<Json<MarketDetailResponse>, StatusCode> {
    let (topic, feed) = state.service.topic_feed(&topic_id, state.default_limit).await;
    let Some(topic) = topic else {
        return Err(StatusCode::NOT_FOUND);
    };

    let recent_count = feed.iter().map(|item| item.opinion_annotations.len()).sum();

    Ok(Json(MarketDetailResponse {
        topic,
        recent_count,
        feed,
    }))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
