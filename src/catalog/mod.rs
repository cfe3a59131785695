//! Topic catalog.
//!
//! Loads the opinion-market metadata from `opinion_topics.json` and indexes
//! it by topic id. A missing or malformed file yields an empty catalog so
//! the server keeps running; the condition is logged, never surfaced.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

use crate::types::{HubError, Topic};

/// In-memory topic catalog, indexed by id, preserving file order.
#[derive(Debug, Default)]
pub struct TopicCatalog {
    topics: Vec<Topic>,
    index: HashMap<String, usize>,
}

impl TopicCatalog {
    /// Load the catalog from a JSON file. Failures degrade to an empty
    /// catalog.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Opinion topics file not found");
            return Self::default();
        }
        match Self::read(path) {
            Ok(catalog) => {
                info!(
                    path = %path.display(),
                    topics = catalog.len(),
                    "Opinion topics loaded"
                );
                catalog
            }
            Err(e) => {
                error!(error = %e, "Failed to load opinion topics");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self, HubError> {
        let raw = fs::read_to_string(path).map_err(|e| HubError::Catalog {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let records: Vec<Topic> = serde_json::from_str(&raw).map_err(|e| HubError::Catalog {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_topics(records))
    }

    /// Build a catalog from already-parsed topic records. Records without
    /// an id are dropped; on duplicate ids the first record wins.
    pub fn from_topics(records: Vec<Topic>) -> Self {
        let mut topics = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for topic in records {
            let Some(id) = topic.id() else {
                warn!("Skipping topic record without an id");
                continue;
            };
            let id = id.to_string();
            if index.contains_key(&id) {
                warn!(topic_id = %id, "Duplicate topic id, keeping first");
                continue;
            }
            index.insert(id, topics.len());
            topics.push(topic);
        }

        Self { topics, index }
    }

    pub fn get(&self, topic_id: &str) -> Option<&Topic> {
        self.index.get(topic_id).map(|&i| &self.topics[i])
    }

    /// Topics in file order.
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Available UI category labels: `All` first, then the distinct
    /// non-empty labels sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut labels = BTreeSet::new();
        for topic in &self.topics {
            for category in &topic.ui_categories {
                if !category.is_empty() && category != "All" {
                    labels.insert(category.clone());
                }
            }
        }
        let mut ordered = Vec::with_capacity(labels.len() + 1);
        ordered.push("All".to_string());
        ordered.extend(labels);
        ordered
    }
}

/// Whether a topic belongs to the given UI category. `None` and `"All"`
/// match everything.
pub fn topic_in_category(topic: &Topic, category: Option<&str>) -> bool {
    match category {
        None | Some("All") => true,
        Some(label) => topic.ui_categories.iter().any(|c| c == label),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
