//! End-to-end tests of the archive-first / demo-fallback selection.
//!
//! Uses the bundled `static/data` files (tests run from the crate root)
//! and the in-memory mock archive.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use opinion_hub::archive::IntelligenceArchive;
use opinion_hub::catalog::TopicCatalog;
use opinion_hub::feed::OpinionFeedService;
use opinion_hub::server::{build_router, ServerState};

use crate::mock_archive::MockArchive;

const TOPICS_PATH: &str = "static/data/opinion_topics.json";
const DEMO_FEED_PATH: &str = "static/data/opinion_demo_feed.json";

fn app_with_archive(archive: Option<Arc<dyn IntelligenceArchive>>) -> Router {
    let catalog = TopicCatalog::load(TOPICS_PATH);
    assert!(!catalog.is_empty(), "bundled topics file must load");

    let service = OpinionFeedService::new(archive, catalog, DEMO_FEED_PATH);
    build_router(Arc::new(ServerState {
        service,
        default_limit: 50,
        market_sample_limit: 200,
    }))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 10_000_000).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn item_uuids(json: &serde_json::Value, key: &str) -> Vec<String> {
    json[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["uuid"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Feed route
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feed_served_from_archive_when_live() {
    let archive = Arc::new(MockArchive::new());
    let app = app_with_archive(Some(archive.clone()));

    let (status, json) = get_json(app, "/opinion/feed").await;
    assert_eq!(status, StatusCode::OK);

    let uuids = item_uuids(&json, "items");
    assert_eq!(uuids, vec!["live-001", "live-002"]); // newest first, live-003 filtered
    assert_eq!(archive.query_count(), 1);
}

#[tokio::test]
async fn feed_falls_back_to_demo_on_archive_error() {
    let archive = Arc::new(MockArchive::new());
    archive.set_error("connection refused");
    let app = app_with_archive(Some(archive.clone()));

    let (status, json) = get_json(app, "/opinion/feed").await;
    // The failure is swallowed: the user still gets a 200 with data
    assert_eq!(status, StatusCode::OK);

    let uuids = item_uuids(&json, "items");
    assert!(uuids.iter().all(|u| u.starts_with("demo-feed-")));
    assert_eq!(uuids.len(), 6);
    assert_eq!(archive.query_count(), 1);
}

#[tokio::test]
async fn feed_falls_back_to_demo_on_empty_archive() {
    let archive = Arc::new(MockArchive::empty());
    let app = app_with_archive(Some(archive));

    let (status, json) = get_json(app, "/opinion/feed").await;
    assert_eq!(status, StatusCode::OK);
    assert!(item_uuids(&json, "items")
        .iter()
        .all(|u| u.starts_with("demo-feed-")));
}

#[tokio::test]
async fn feed_category_filter_applies_on_fallback() {
    let app = app_with_archive(None);

    let (status, json) = get_json(app, "/opinion/feed?category=Crypto").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "Crypto");

    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["uuid"], "demo-feed-004");
    assert_eq!(
        items[0]["opinion_annotations"][0]["topic_id"],
        "opinion_3550"
    );
}

#[tokio::test]
async fn feed_categories_are_stable_across_sources() {
    let live_app = app_with_archive(Some(Arc::new(MockArchive::new())));
    let demo_app = app_with_archive(None);

    let (_, live) = get_json(live_app, "/opinion/feed").await;
    let (_, demo) = get_json(demo_app, "/opinion/feed").await;

    // Category tabs come from the catalog, not the data source
    assert_eq!(live["categories"], demo["categories"]);
    assert_eq!(
        live["categories"],
        serde_json::json!(["All", "Crypto", "Economy", "Politics", "Rates", "Tech", "World"])
    );
}

#[tokio::test]
async fn feed_contract_identical_between_sources() {
    let live_app = app_with_archive(Some(Arc::new(MockArchive::new())));
    let demo_app = app_with_archive(None);

    let (_, live) = get_json(live_app, "/opinion/feed").await;
    let (_, demo) = get_json(demo_app, "/opinion/feed").await;

    let keys = |v: &serde_json::Value| -> Vec<String> {
        v.as_object().unwrap().keys().cloned().collect()
    };

    // Same envelope, same item shape, same annotation shape: a template
    // consuming either response needs no changes.
    assert_eq!(keys(&live), keys(&demo));
    assert_eq!(keys(&live["items"][0]), keys(&demo["items"][0]));
    assert_eq!(
        keys(&live["items"][0]["opinion_annotations"][0]),
        keys(&demo["items"][0]["opinion_annotations"][0])
    );
}

// ---------------------------------------------------------------------------
// Markets list route
// ---------------------------------------------------------------------------

#[tokio::test]
async fn markets_list_from_demo_data() {
    let app = app_with_archive(None);

    let (status, json) = get_json(app, "/markets").await;
    assert_eq!(status, StatusCode::OK);

    let markets = json["markets"].as_array().unwrap();
    assert_eq!(markets.len(), 6);

    let contested = markets
        .iter()
        .find(|m| m["topic_id"] == "opinion_1463")
        .unwrap();
    // Two demo items annotate opinion_1463
    assert_eq!(contested["recent_count"], 2);
    assert_eq!(
        contested["latest_headline"],
        "State election board receives formal complaint over ballot audit"
    );
}

#[tokio::test]
async fn markets_list_category_filter() {
    let app = app_with_archive(None);

    let (status, json) = get_json(app, "/markets?category=Economy").await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = json["markets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["topic_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["opinion_2001", "opinion_2044"]);
}

#[tokio::test]
async fn markets_list_stats_follow_live_source() {
    let app = app_with_archive(Some(Arc::new(MockArchive::new())));

    let (_, json) = get_json(app, "/markets").await;
    let cpi = json["markets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["topic_id"] == "opinion_2044")
        .unwrap()
        .clone();
    assert_eq!(cpi["recent_count"], 1);
    assert_eq!(cpi["latest_headline"], "Core CPI surprises to the upside");
}

// ---------------------------------------------------------------------------
// Market detail route
// ---------------------------------------------------------------------------

#[tokio::test]
async fn market_detail_returns_requested_topic() {
    let app = app_with_archive(None);

    let (status, json) = get_json(app, "/markets/opinion_1463").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["topic"]["topic_id"], "opinion_1463");

    // Every feed annotation is scoped to the requested topic
    for item in json["feed"].as_array().unwrap() {
        for ann in item["opinion_annotations"].as_array().unwrap() {
            assert_eq!(ann["topic_id"], "opinion_1463");
        }
    }
    assert_eq!(json["recent_count"], 2);
}

#[tokio::test]
async fn market_detail_falls_back_on_archive_error() {
    let archive = Arc::new(MockArchive::new());
    archive.set_error("timeout");
    let app = app_with_archive(Some(archive));

    let (status, json) = get_json(app, "/markets/opinion_2001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["topic"]["topic_id"], "opinion_2001");
    assert_eq!(json["feed"][0]["uuid"], "demo-feed-002");
}

#[tokio::test]
async fn market_detail_unknown_topic_is_404() {
    let app = app_with_archive(None);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/markets/opinion_99999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn market_detail_topic_absent_from_live_falls_back() {
    // The mock archive is up but none of its documents mention this topic,
    // so the topic-filtered live result is empty and the demo item answers.
    let app = app_with_archive(Some(Arc::new(MockArchive::new())));

    let (status, json) = get_json(app, "/markets/opinion_4090").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["feed"][0]["uuid"], "demo-feed-005");
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn archive_recovery_switches_back_without_contract_change() {
    let archive = Arc::new(MockArchive::new());
    let catalog = TopicCatalog::load(TOPICS_PATH);
    let service = OpinionFeedService::new(
        Some(archive.clone() as Arc<dyn IntelligenceArchive>),
        catalog,
        DEMO_FEED_PATH,
    );
    let state = Arc::new(ServerState {
        service,
        default_limit: 50,
        market_sample_limit: 200,
    });

    // Down: demo answers
    archive.set_error("down for maintenance");
    let (_, degraded) = get_json(build_router(state.clone()), "/opinion/feed").await;
    assert!(degraded["items"][0]["uuid"]
        .as_str()
        .unwrap()
        .starts_with("demo-feed-"));

    // Back up: live answers, same shape
    archive.clear_error();
    let (_, recovered) = get_json(build_router(state), "/opinion/feed").await;
    assert_eq!(recovered["items"][0]["uuid"], "live-001");

    let keys = |v: &serde_json::Value| -> Vec<String> {
        v.as_object().unwrap().keys().cloned().collect()
    };
    assert_eq!(keys(&degraded["items"][0]), keys(&recovered["items"][0]));
}
