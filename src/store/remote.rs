//! Fetching scan records from the scan store's REST endpoint.
//!
//! The store exposes tables PostgREST-style under `/rest/v1/<table>`
//! and authenticates with an API key sent both as `apikey` and as a
//! bearer token.

use crate::error::{StoreError, StoreResult};
use crate::models::ScanRecord;
use std::time::Duration;
use tracing::{debug, info};

/// Client for one table of scan records.
pub struct RestSource {
    client: reqwest::Client,
    base_url: String,
    table: String,
    api_key: String,
}

impl RestSource {
    /// Create a client for `table` under `base_url`.
    pub fn new(
        base_url: &str,
        table: &str,
        api_key: String,
        timeout_seconds: u64,
    ) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            api_key,
        })
    }

    /// URL listing every record, newest first.
    pub fn records_url(&self) -> String {
        format!(
            "{}/rest/v1/{}?select=*&order=created_at.desc",
            self.base_url, self.table
        )
    }

    /// Human-readable name of this source.
    pub fn describe(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Fetch all scan records.
    pub async fn fetch(&self) -> StoreResult<Vec<ScanRecord>> {
        let url = self.records_url();
        info!("Fetching scan records from {}", self.describe());

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let records: Vec<ScanRecord> = response.json().await?;
        debug!("Fetched {} records", records.len());

        Ok(records)
    }
}
