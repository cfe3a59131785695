//! Intelligence hub HTTP client.
//!
//! Queries the archive service over its REST API. Reads are authenticated
//! with an optional bearer key; without one the hub serves public documents
//! only.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ArchiveDoc, IntelligenceArchive};

const ARCHIVE_NAME: &str = "hub";

/// Page shape returned by `GET /api/intelligence`.
#[derive(Debug, Deserialize)]
struct ArchivePage {
    #[serde(default)]
    documents: Vec<ArchiveDoc>,
    #[serde(default)]
    total: u64,
}

/// HTTP client for the intelligence hub archive.
pub struct HubClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HubClient {
    /// Create a new hub client.
    ///
    /// `api_key` is optional — public documents can be queried without it.
    pub fn new(base_url: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent("opinion-hub/0.1.0")
            .build()
            .context("Failed to build HTTP client for intelligence hub")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn query_url(&self, threshold: u32, skip: usize, limit: usize) -> String {
        format!(
            "{}/api/intelligence?threshold={threshold}&skip={skip}&limit={limit}",
            self.base_url,
        )
    }
}

#[async_trait]
impl IntelligenceArchive for HubClient {
    async fn query_intelligence(
        &self,
        threshold: u32,
        skip: usize,
        limit: usize,
    ) -> Result<(Vec<ArchiveDoc>, u64)> {
        let url = self.query_url(threshold, skip, limit);
        debug!(url = %url, "Querying intelligence archive");

        let mut req = self.http.get(&url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .context("Intelligence archive request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Intelligence archive error {status}: {body}");
        }

        let page: ArchivePage = resp
            .json()
            .await
            .context("Failed to parse intelligence archive response")?;

        debug!(
            fetched = page.documents.len(),
            total = page.total,
            "Archive page fetched"
        );

        Ok((page.documents, page.total))
    }

    fn name(&self) -> &str {
        ARCHIVE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
