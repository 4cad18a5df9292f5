//! Scan record sources.
//!
//! Records come either from exported files or straight from the scan
//! store's REST endpoint. Either way they are handed back newest first,
//! the order the store itself lists them in.

pub mod loader;
pub mod remote;

use crate::analysis::sort_newest_first;
use crate::config::SourceConfig;
use crate::error::{StoreError, StoreResult};
use crate::models::ScanRecord;
use std::path::PathBuf;
use tracing::info;

pub use loader::load_records;
pub use remote::RestSource;

/// Scan records together with where they came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedScans {
    /// Records, newest first.
    pub records: Vec<ScanRecord>,
    /// Human-readable description of each source.
    pub sources: Vec<String>,
}

/// Load scan records from every source in the configuration.
///
/// File inputs and the REST endpoint may be combined.
pub async fn load(config: &SourceConfig, show_progress: bool) -> StoreResult<LoadedScans> {
    if config.inputs.is_empty() && config.endpoint.is_none() {
        return Err(StoreError::NoSource);
    }

    let mut loaded = LoadedScans::default();

    if !config.inputs.is_empty() {
        let paths: Vec<PathBuf> = config.inputs.iter().map(PathBuf::from).collect();
        loaded.records.extend(load_records(&paths, show_progress).await?);
        loaded.sources.extend(config.inputs.iter().cloned());
    }

    if let Some(ref endpoint) = config.endpoint {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| StoreError::MissingApiKey(config.api_key_env.clone()))?;
        let source = RestSource::new(endpoint, &config.table, api_key, config.timeout_seconds)?;

        loaded.records.extend(source.fetch().await?);
        loaded.sources.push(source.describe());
    }

    sort_newest_first(&mut loaded.records);
    info!(
        "Loaded {} scan records from {} source(s)",
        loaded.records.len(),
        loaded.sources.len()
    );

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_requires_a_source() {
        let config = SourceConfig::default();
        assert!(matches!(load(&config, false).await, Err(StoreError::NoSource)));
    }

    #[tokio::test]
    async fn test_load_sorts_newest_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scans.jsonl");
        fs::write(
            &path,
            concat!(
                "{\"phone_number\": \"222-2222\", \"user_id\": \"u1\", \"result\": \"Suspicious\", \"created_at\": \"2024-01-01T00:00:00Z\"}\n",
                "{\"phone_number\": \"333-3333\", \"user_id\": \"u1\", \"result\": \"Safe\"}\n",
                "{\"phone_number\": \"222-2222\", \"user_id\": \"u1\", \"result\": \"Safe\", \"created_at\": \"2024-01-02T00:00:00Z\"}\n",
            ),
        )
        .unwrap();

        let config = SourceConfig {
            inputs: vec![path.to_string_lossy().to_string()],
            ..SourceConfig::default()
        };
        let loaded = load(&config, false).await.unwrap();

        let results: Vec<&str> = loaded.records.iter().map(|r| r.result.as_str()).collect();
        assert_eq!(results, vec!["Safe", "Suspicious", "Safe"]);
        assert_eq!(loaded.records[2].phone_number, "333-3333");
        assert_eq!(loaded.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_load_endpoint_requires_api_key() {
        let config = SourceConfig {
            endpoint: Some("https://store.example.com".to_string()),
            api_key_env: "SPAMSHIELD_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..SourceConfig::default()
        };

        assert!(matches!(
            load(&config, false).await,
            Err(StoreError::MissingApiKey(_))
        ));
    }
}
