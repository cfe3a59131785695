//! Opinion feed service — the data-source selector behind every route.
//!
//! Each query is attempted against the live intelligence archive first.
//! When the archive is unavailable, errors, or returns nothing usable, the
//! query is answered from the bundled demo feed with the same filtering
//! semantics, so the pages render identically either way. Failures on the
//! fallback path are logged and degrade to empty results, never errors.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::archive::{ArchiveDoc, IntelligenceArchive};
use crate::catalog::{topic_in_category, TopicCatalog};
use crate::types::{
    format_archive_time, parse_archive_time, FeedItem, MarketCard, OpinionAnnotation,
    RawAnnotation, Topic,
};

/// Archive pages are over-fetched by this factor, since documents without
/// admissible annotations are dropped during conversion.
const ARCHIVE_OVERFETCH: usize = 3;

// ---------------------------------------------------------------------------
// Demo feed records
// ---------------------------------------------------------------------------

/// An entry in `opinion_demo_feed.json`. Annotations are kept raw and run
/// through the same admission filter as archive annotations.
#[derive(Debug, Deserialize)]
struct DemoFeedItem {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    link: String,
    #[serde(default)]
    opinion_annotations: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Serves the opinion pages' data requirements, archive-first with demo
/// fallback.
pub struct OpinionFeedService {
    archive: Option<Arc<dyn IntelligenceArchive>>,
    catalog: TopicCatalog,
    demo_feed_path: PathBuf,
}

#[derive(Default)]
struct TopicStats {
    recent_count: u64,
    latest_headline: Option<String>,
    latest_published_at: Option<String>,
}

impl OpinionFeedService {
    pub fn new(
        archive: Option<Arc<dyn IntelligenceArchive>>,
        catalog: TopicCatalog,
        demo_feed_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            archive,
            catalog,
            demo_feed_path: demo_feed_path.into(),
        }
    }

    /// Available UI category labels, `All` first.
    pub fn categories(&self) -> Vec<String> {
        self.catalog.categories()
    }

    /// Look up a topic by id.
    pub fn topic(&self, topic_id: &str) -> Option<&Topic> {
        self.catalog.get(topic_id)
    }

    /// The category-filtered feed, newest first, at most `limit` items.
    pub async fn feed(&self, category: Option<&str>, limit: usize) -> Vec<FeedItem> {
        let items = self.query_from_archive(category, limit, None).await;
        if !items.is_empty() {
            return items;
        }
        self.load_demo_feed(category, limit, None)
    }

    /// Market cards for the list page: topics filtered by category, joined
    /// with recent-activity stats sampled from the feed.
    pub async fn list_markets(&self, category: Option<&str>, sample_limit: usize) -> Vec<MarketCard> {
        let sample = self.feed(category, sample_limit).await;

        // First item seen per topic wins the headline — the feed is
        // already newest-first.
        let mut by_topic: HashMap<String, TopicStats> = HashMap::new();
        for item in &sample {
            for ann in &item.opinion_annotations {
                let stats = by_topic.entry(ann.topic_id.clone()).or_default();
                stats.recent_count += 1;
                if stats.latest_published_at.is_none() {
                    stats.latest_headline = Some(item.title.clone());
                    stats.latest_published_at = Some(item.published_at.clone());
                }
            }
        }

        self.catalog
            .topics()
            .filter(|topic| topic_in_category(topic, category))
            .filter_map(|topic| {
                let topic_id = topic.id()?.to_string();
                let stats = by_topic.remove(&topic_id).unwrap_or_default();
                Some(MarketCard {
                    topic_id,
                    market_title: topic.display_title().to_string(),
                    event_archetype: topic.event_archetype.clone(),
                    opinion_market_url: topic.opinion_market_url.clone(),
                    ui_categories: topic.ui_categories.clone(),
                    domains: topic.domains.clone(),
                    recent_count: stats.recent_count,
                    latest_headline: stats.latest_headline,
                    latest_published_at: stats.latest_published_at,
                })
            })
            .collect()
    }

    /// A single market's detail: the topic record plus its timeline feed.
    pub async fn topic_feed(&self, topic_id: &str, limit: usize) -> (Option<Topic>, Vec<FeedItem>) {
        let topic = self.catalog.get(topic_id).cloned();
        let mut feed = self.query_from_archive(None, limit, Some(topic_id)).await;
        if feed.is_empty() {
            feed = self.load_demo_feed(None, limit, Some(topic_id));
        }
        (topic, feed)
    }

    // -- Private helpers ---------------------------------------------------

    /// Query the archive and convert documents to feed items. Any failure
    /// (or no configured archive) yields an empty vec so the caller can
    /// fall back.
    async fn query_from_archive(
        &self,
        category: Option<&str>,
        limit: usize,
        topic_filter: Option<&str>,
    ) -> Vec<FeedItem> {
        let Some(archive) = &self.archive else {
            debug!("No archive configured, using demo data");
            return Vec::new();
        };

        let fetch_limit = limit.saturating_mul(ARCHIVE_OVERFETCH);
        let docs = match archive.query_intelligence(0, 0, fetch_limit).await {
            Ok((docs, _total)) => docs,
            Err(e) => {
                warn!(
                    archive = archive.name(),
                    error = %e,
                    "Opinion feed query failed, falling back to demo data"
                );
                return Vec::new();
            }
        };

        let mut items = Vec::new();
        for doc in &docs {
            if let Some(item) = self.build_feed_item(doc, category, topic_filter) {
                items.push(item);
            }
            if items.len() >= limit {
                break;
            }
        }
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        items
    }

    /// Convert an archive document to a feed item. Documents with no
    /// admissible annotations are dropped.
    fn build_feed_item(
        &self,
        doc: &ArchiveDoc,
        category: Option<&str>,
        topic_filter: Option<&str>,
    ) -> Option<FeedItem> {
        let annotations: Vec<OpinionAnnotation> = doc
            .raw_annotations()
            .iter()
            .filter_map(RawAnnotation::from_value)
            .filter_map(|raw| self.admit_annotation(raw, category, topic_filter))
            .collect();

        if annotations.is_empty() {
            return None;
        }

        let published = doc.published_time_value().and_then(parse_archive_time);

        Some(FeedItem {
            uuid: doc
                .uuid
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            title: doc.display_title(),
            source: doc.display_source(),
            summary: doc.display_summary(),
            published_at: format_archive_time(published),
            opinion_annotations: annotations,
            link: doc.display_link(),
        })
    }

    /// Admission filter shared by the archive and demo paths: the topic id
    /// must exist in the catalog, pass the optional topic filter, and its
    /// topic must pass the category filter. Admitted annotations carry the
    /// catalog's title and category labels.
    fn admit_annotation(
        &self,
        raw: RawAnnotation,
        category: Option<&str>,
        topic_filter: Option<&str>,
    ) -> Option<OpinionAnnotation> {
        if let Some(filter) = topic_filter {
            if raw.topic_id != filter {
                return None;
            }
        }
        let topic = self.catalog.get(&raw.topic_id)?;
        if !topic_in_category(topic, category) {
            return None;
        }

        Some(OpinionAnnotation {
            topic_id: raw.topic_id,
            market_title: topic.display_title().to_string(),
            sentiment_for_yes: raw.sentiment_for_yes,
            impact_level: raw.impact_level,
            reason: raw.reason,
            opinion_market_url: raw
                .opinion_market_url
                .or_else(|| topic.opinion_market_url.clone()),
            ui_categories: topic.ui_categories.clone(),
        })
    }

    /// Read the bundled demo feed, applying the same filtering semantics
    /// as the archive path. Missing or malformed files degrade to empty.
    fn load_demo_feed(
        &self,
        category: Option<&str>,
        limit: usize,
        topic_filter: Option<&str>,
    ) -> Vec<FeedItem> {
        let path: &Path = &self.demo_feed_path;
        if !path.exists() {
            warn!(path = %path.display(), "Opinion demo feed missing");
            return Vec::new();
        }

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read demo feed");
                return Vec::new();
            }
        };
        let entries: Vec<DemoFeedItem> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to parse demo feed");
                return Vec::new();
            }
        };

        let mut filtered = Vec::new();
        for entry in entries {
            let annotations: Vec<OpinionAnnotation> = entry
                .opinion_annotations
                .iter()
                .filter_map(RawAnnotation::from_value)
                .filter_map(|raw| self.admit_annotation(raw, category, topic_filter))
                .collect();
            if annotations.is_empty() {
                continue;
            }

            filtered.push(FeedItem {
                uuid: entry
                    .uuid
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                title: entry.title.unwrap_or_default(),
                source: entry.source.unwrap_or_else(|| "Demo source".to_string()),
                summary: entry.summary,
                published_at: entry.published_at.unwrap_or_default(),
                opinion_annotations: annotations,
                link: entry.link,
            });
            if filtered.len() >= limit {
                break;
            }
        }
        filtered
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
