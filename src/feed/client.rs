use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::NoticeSource;
use crate::config::FeedConfig;
use crate::models::Notice;

/// Client for the Federal Register documents search API
pub struct FederalRegisterClient {
    client: Client,
    base_url: String,
    agency_id: String,
    term: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Notice>,
}

impl FederalRegisterClient {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agency_id: config.agency_id.clone(),
            term: config.term.clone(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/api/v1/documents.json", self.base_url)
    }

    /// Query the registry, surfacing every failure as an error
    pub async fn search(&self, date: NaiveDate) -> Result<Vec<Notice>> {
        let publication_date = date.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(self.search_url())
            .query(&[
                ("conditions[agency_ids][]", self.agency_id.as_str()),
                ("conditions[publication_date][is]", publication_date.as_str()),
                ("conditions[term]", self.term.as_str()),
            ])
            .send()
            .await
            .context("Failed to query document feed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Document feed error ({}): {}", status, body);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse document feed response")?;

        debug!(count = parsed.results.len(), "Parsed feed results");

        Ok(parsed.results)
    }
}

#[async_trait]
impl NoticeSource for FederalRegisterClient {
    #[instrument(skip(self), fields(agency = %self.agency_id))]
    async fn fetch_notices(&self, date: NaiveDate) -> Vec<Notice> {
        match self.search(date).await {
            Ok(notices) => {
                info!(count = notices.len(), "Fetched notices");
                notices
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Document feed unavailable, treating as empty");
                Vec::new()
            }
        }
    }
}
