//! Mock intelligence archive for integration testing.
//!
//! Provides a deterministic `IntelligenceArchive` implementation that
//! returns known documents or a forced error — all in-memory with no
//! external dependencies.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

use opinion_hub::archive::{ArchiveDoc, IntelligenceArchive};

/// A mock archive for deterministic testing.
///
/// All state is in-memory. Documents and failure behavior are fully
/// controllable from test code.
pub struct MockArchive {
    docs: Mutex<Vec<ArchiveDoc>>,
    /// If set, all queries return this error.
    force_error: Mutex<Option<String>>,
    queries: Mutex<u64>,
}

impl MockArchive {
    /// Create a mock archive pre-loaded with documents that reference the
    /// bundled topic catalog.
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(Self::default_docs()),
            force_error: Mutex::new(None),
            queries: Mutex::new(0),
        }
    }

    /// Create an empty mock archive (queries succeed but return nothing).
    pub fn empty() -> Self {
        Self {
            docs: Mutex::new(Vec::new()),
            force_error: Mutex::new(None),
            queries: Mutex::new(0),
        }
    }

    /// Force all subsequent queries to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    /// How many queries have been attempted so far.
    pub fn query_count(&self) -> u64 {
        *self.queries.lock().unwrap()
    }

    /// Documents referencing topics from `static/data/opinion_topics.json`,
    /// with known timestamps for deterministic ordering.
    fn default_docs() -> Vec<ArchiveDoc> {
        let docs = json!([
            {
                "UUID": "live-001",
                "TITLE": "Certification hearing scheduled in contested county",
                "INFORMANT": "Live Wire",
                "SUMMARY": "The county board set a certification hearing after the recount margin narrowed.",
                "PUB_TIME": "2026-03-20 08:15:00",
                "URL": "https://news.example.com/live/certification-hearing",
                "APPENDIX": {
                    "prediction_annotations": [
                        {
                            "topic_id": "opinion_1463",
                            "sentiment_for_yes": "bullish",
                            "impact_level": "high",
                            "reason": "A narrowing margin makes a formal contest more likely."
                        }
                    ]
                }
            },
            {
                "UUID": "live-002",
                "TITLE": "Core CPI surprises to the upside",
                "INFORMANT": "Live Wire",
                "SUMMARY": "Monthly core CPI came in above consensus for the second straight print.",
                "PUB_TIME": "2026-03-19 12:45:00",
                "URL": "https://news.example.com/live/core-cpi",
                "APPENDIX": {
                    "prediction_annotations": [
                        {
                            "topic_id": "opinion_2044",
                            "sentiment_for_yes": "bullish",
                            "impact_level": "high",
                            "reason": "Back-to-back upside surprises raise the quarterly average."
                        },
                        {
                            "topic_id": "opinion_2001",
                            "sentiment_for_yes": "bearish",
                            "impact_level": "medium",
                            "reason": "Hot inflation delays the first cut."
                        }
                    ]
                }
            },
            {
                "UUID": "live-003",
                "TITLE": "Document with no catalog topics",
                "INFORMANT": "Live Wire",
                "PUB_TIME": "2026-03-18 10:00:00",
                "APPENDIX": {
                    "prediction_annotations": [
                        {"topic_id": "opinion_not_in_catalog"}
                    ]
                }
            }
        ]);
        serde_json::from_value(docs).unwrap()
    }
}

#[async_trait]
impl IntelligenceArchive for MockArchive {
    async fn query_intelligence(
        &self,
        _threshold: u32,
        _skip: usize,
        _limit: usize,
    ) -> Result<(Vec<ArchiveDoc>, u64)> {
        *self.queries.lock().unwrap() += 1;

        if let Some(msg) = self.force_error.lock().unwrap().as_ref() {
            anyhow::bail!("{msg}");
        }

        let docs = self.docs.lock().unwrap().clone();
        let total = docs.len() as u64;
        Ok((docs, total))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
