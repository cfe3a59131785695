//! Intelligence archive integration.
//!
//! Defines the `IntelligenceArchive` trait — the live backend every opinion
//! route queries first — and the loose `ArchiveDoc` record shape archived
//! documents arrive in. The HTTP implementation lives in `hub`.

pub mod hub;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Appendix key under which the archiver stores its ingestion timestamp.
pub const ARCHIVED_TIME_KEY: &str = "time_archived";

/// Abstraction over the intelligence archive backend.
///
/// Implementors return archived documents in reverse-chronological pages.
/// The feed service treats any error (or an empty page) as the trigger to
/// fall back to bundled demo data.
#[async_trait]
pub trait IntelligenceArchive: Send + Sync {
    /// Query archived intelligence documents.
    ///
    /// Returns the documents plus the total number of matches in the
    /// archive (for pagination displays).
    async fn query_intelligence(
        &self,
        threshold: u32,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<ArchiveDoc>, u64)>;

    /// Archive name for logging and identification.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Archive document
// ---------------------------------------------------------------------------

/// An archived intelligence document.
///
/// The archive stores documents with upper-cased keys and has accumulated
/// several generations of field spellings; everything is optional and the
/// accessors encode the fallback chains the pages rely on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveDoc {
    #[serde(default, rename = "UUID")]
    pub uuid: Option<String>,
    #[serde(default, rename = "TITLE")]
    pub title: Option<String>,
    #[serde(default, rename = "EVENT_TITLE")]
    pub event_title: Option<String>,
    #[serde(default, rename = "INFORMANT")]
    pub informant: Option<String>,
    #[serde(default, rename = "SOURCE")]
    pub source: Option<String>,
    #[serde(default, rename = "SUMMARY")]
    pub summary: Option<String>,
    #[serde(default, rename = "EVENT_BRIEF")]
    pub event_brief: Option<String>,
    #[serde(default, rename = "EVENT_TEXT")]
    pub event_text: Option<String>,
    /// Publication time — unix seconds or one of several string formats.
    #[serde(default, rename = "PUB_TIME")]
    pub pub_time: Option<Value>,
    #[serde(default, rename = "TIME")]
    pub time: Option<Value>,
    #[serde(default, rename = "URL")]
    pub url: Option<String>,
    /// Free-form appendix attached by the archiver.
    #[serde(default, rename = "APPENDIX")]
    pub appendix: Value,
    /// Some producers attach annotations at the top level instead of the
    /// appendix.
    #[serde(default)]
    pub prediction_annotations: Option<Value>,
}

impl ArchiveDoc {
    pub fn display_title(&self) -> String {
        non_empty(&self.title)
            .or_else(|| non_empty(&self.event_title))
            .unwrap_or_else(|| "Untitled intel".to_string())
    }

    pub fn display_source(&self) -> String {
        non_empty(&self.informant)
            .or_else(|| non_empty(&self.source))
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn display_summary(&self) -> String {
        non_empty(&self.summary)
            .or_else(|| non_empty(&self.event_brief))
            .or_else(|| non_empty(&self.event_text))
            .unwrap_or_default()
    }

    pub fn display_link(&self) -> String {
        non_empty(&self.url)
            .or_else(|| non_empty(&self.informant))
            .unwrap_or_default()
    }

    /// Best-available publication time value:
    /// `PUB_TIME` → `TIME` → `APPENDIX.time_archived`.
    pub fn published_time_value(&self) -> Option<&Value> {
        self.pub_time
            .as_ref()
            .filter(|v| !v.is_null())
            .or_else(|| self.time.as_ref().filter(|v| !v.is_null()))
            .or_else(|| self.appendix.get(ARCHIVED_TIME_KEY).filter(|v| !v.is_null()))
    }

    /// Raw prediction-annotation records.
    ///
    /// Accepts a plain list, or a `{topics: [...]}`/`{markets: [...]}`
    /// mapping, found either in the appendix or at the top level.
    pub fn raw_annotations(&self) -> Vec<Value> {
        let raw = self
            .appendix
            .get("prediction_annotations")
            .filter(|v| !v.is_null())
            .cloned()
            .or_else(|| self.prediction_annotations.clone().filter(|v| !v.is_null()));

        let raw = match raw {
            Some(Value::Object(map)) => map
                .get("topics")
                .or_else(|| map.get("markets"))
                .cloned(),
            other => other,
        };

        match raw {
            Some(Value::Array(list)) => list,
            _ => Vec::new(),
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field.as_deref().filter(|s| !s.is_empty()).map(String::from)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
