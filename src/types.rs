//! Shared types for the Opinion hub.
//!
//! These types form the data model used across all modules. The upstream
//! JSON (topic files, archive documents, demo feed) is loosely shaped, so
//! most fields are optional with explicit fallback accessors.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// An opinion-market subject, loaded from `opinion_topics.json`.
///
/// Older topic exports use `market_id`/`title` instead of
/// `topic_id`/`market_title`, so both spellings are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topic {
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub market_id: Option<String>,
    #[serde(default)]
    pub market_title: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub event_archetype: String,
    #[serde(default)]
    pub opinion_market_url: Option<String>,
    #[serde(default)]
    pub ui_categories: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
}

impl Topic {
    /// Canonical id: `topic_id`, falling back to the legacy `market_id`.
    pub fn id(&self) -> Option<&str> {
        self.topic_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.market_id.as_deref().filter(|s| !s.is_empty()))
    }

    /// Display title: `market_title`, falling back to the legacy `title`.
    pub fn display_title(&self) -> &str {
        self.market_title
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.title.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("Opinion market")
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({})",
            self.id().unwrap_or("?"),
            self.display_title(),
            self.ui_categories.join("/"),
        )
    }
}

// ---------------------------------------------------------------------------
// Feed items
// ---------------------------------------------------------------------------

/// A single intelligence entry as served to the pages.
///
/// The shape is identical whether the item came from the live archive or
/// from the bundled demo feed — the pages never see which source answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub uuid: String,
    pub title: String,
    pub source: String,
    pub summary: String,
    /// Formatted as `%Y-%m-%d %H:%M UTC` (lexicographically sortable).
    pub published_at: String,
    pub opinion_annotations: Vec<OpinionAnnotation>,
    pub link: String,
}

/// A market annotation attached to a feed item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpinionAnnotation {
    pub topic_id: String,
    pub market_title: String,
    pub sentiment_for_yes: Option<String>,
    pub impact_level: String,
    pub reason: String,
    pub opinion_market_url: Option<String>,
    pub ui_categories: Vec<String>,
}

impl fmt::Display for OpinionAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} (impact: {})",
            self.topic_id,
            self.sentiment_for_yes.as_deref().unwrap_or("?"),
            self.impact_level,
        )
    }
}

/// A raw annotation record before catalog enrichment.
///
/// Annotation producers have used several field spellings over time:
/// `market_id` for `topic_id`, `verdict` for `sentiment_for_yes`,
/// `impact` for `impact_level`, `note` for `reason`. All are accepted.
#[derive(Debug, Clone)]
pub struct RawAnnotation {
    pub topic_id: String,
    pub sentiment_for_yes: Option<String>,
    pub impact_level: String,
    pub reason: String,
    pub opinion_market_url: Option<String>,
}

impl RawAnnotation {
    /// Parse a loose JSON annotation record. Returns `None` when no topic
    /// id can be recovered.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let topic_id = string_field(obj, "topic_id").or_else(|| string_field(obj, "market_id"))?;

        Some(Self {
            topic_id,
            sentiment_for_yes: string_field(obj, "sentiment_for_yes")
                .or_else(|| string_field(obj, "verdict")),
            impact_level: string_field(obj, "impact_level")
                .or_else(|| string_field(obj, "impact"))
                .unwrap_or_else(|| "unknown".to_string()),
            reason: string_field(obj, "reason")
                .or_else(|| string_field(obj, "note"))
                .unwrap_or_default(),
            opinion_market_url: string_field(obj, "opinion_market_url"),
        })
    }
}

/// Extract a non-empty string field, stringifying bools and numbers the
/// way the upstream producers do.
fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Market cards
// ---------------------------------------------------------------------------

/// A market list row: topic metadata plus recent-feed stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCard {
    pub topic_id: String,
    pub market_title: String,
    pub event_archetype: String,
    pub opinion_market_url: Option<String>,
    pub ui_categories: Vec<String>,
    pub domains: Vec<String>,
    pub recent_count: u64,
    pub latest_headline: Option<String>,
    pub latest_published_at: Option<String>,
}

impl fmt::Display for MarketCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | recent={} | latest={}",
            self.topic_id,
            self.market_title,
            self.recent_count,
            self.latest_headline.as_deref().unwrap_or("-"),
        )
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Domain-specific error types for the Opinion hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Archive error ({archive}): {message}")]
    Archive { archive: String, message: String },

    #[error("Topic catalog error ({path}): {message}")]
    Catalog { path: String, message: String },

    #[error("Demo feed error ({path}): {message}")]
    DemoFeed { path: String, message: String },

    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Archive timestamps
// ---------------------------------------------------------------------------

/// Parse an archive timestamp. Accepts unix seconds (integer or float) and
/// the string formats historically seen in archived documents.
pub fn parse_archive_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp(secs, 0)
        }
        Value::String(s) => parse_time_str(s),
        _ => None,
    }
}

fn parse_time_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    None
}

/// Format a timestamp for the pages. Unknown times render as an empty
/// string rather than a bogus epoch date.
pub fn format_archive_time(value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
