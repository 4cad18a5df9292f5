//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.spamshield.toml` files.

use crate::cli::{Cli, ReportArgs, SourceArgs};
use crate::models::ClassificationPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".spamshield.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scan record source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "spamshield_report.md".to_string()
}

/// Where scan records are loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Export files or directories to read.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Base URL of the scan store's REST endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Table holding scan records.
    #[serde(default = "default_table")]
    pub table: String,

    /// Environment variable holding the store API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            endpoint: None,
            table: default_table(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_table() -> String {
    "scans".to_string()
}

fn default_api_key_env() -> String {
    "SPAMSHIELD_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Dashboard report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Numbers with more reports than this are shown as blocked.
    #[serde(default = "default_blocked_threshold")]
    pub blocked_threshold: usize,

    /// How many numbers the "most reported" section lists.
    #[serde(default = "default_top_numbers")]
    pub top_numbers: usize,

    /// Which record decides a number's classification.
    #[serde(default)]
    pub classification_policy: ClassificationPolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            blocked_threshold: default_blocked_threshold(),
            top_numbers: default_top_numbers(),
            classification_policy: ClassificationPolicy::default(),
        }
    }
}

fn default_blocked_threshold() -> usize {
    5
}

fn default_top_numbers() -> usize {
    10
}

/// Verification classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Report count at which a number is spam regardless of labels.
    #[serde(default = "default_spam_min_reports")]
    pub spam_min_reports: usize,

    /// Distinct reporters needed before a spam label is trusted.
    #[serde(default = "default_spam_min_reporters")]
    pub spam_min_reporters: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            spam_min_reports: default_spam_min_reports(),
            spam_min_reporters: default_spam_min_reporters(),
        }
    }
}

fn default_spam_min_reports() -> usize {
    6
}

fn default_spam_min_reporters() -> usize {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge global CLI flags into this configuration.
    pub fn merge_with_args(&mut self, cli: &Cli) {
        if cli.verbose {
            self.general.verbose = true;
        }
    }

    /// Merge source flags. CLI values take precedence when given.
    pub fn merge_source(&mut self, args: &SourceArgs) {
        if !args.input.is_empty() {
            self.source.inputs = args
                .input
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect();
        }
        if let Some(ref endpoint) = args.endpoint {
            self.source.endpoint = Some(endpoint.clone());
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }
    }

    /// Merge `report` subcommand flags.
    pub fn merge_report(&mut self, args: &ReportArgs) {
        self.merge_source(&args.source);

        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }
        if let Some(threshold) = args.blocked_threshold {
            self.report.blocked_threshold = threshold;
        }
        if let Some(policy) = args.policy {
            self.report.classification_policy = policy;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "spamshield_report.md");
        assert_eq!(config.source.table, "scans");
        assert_eq!(config.report.blocked_threshold, 5);
        assert_eq!(
            config.report.classification_policy,
            ClassificationPolicy::FirstSeen
        );
        assert_eq!(config.classifier.spam_min_reports, 6);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "dashboard.md"
verbose = true

[source]
inputs = ["exports/"]
endpoint = "https://store.example.com"

[report]
blocked_threshold = 10
classification_policy = "most-recent"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "dashboard.md");
        assert!(config.general.verbose);
        assert_eq!(config.source.inputs, vec!["exports/"]);
        assert_eq!(
            config.source.endpoint.as_deref(),
            Some("https://store.example.com")
        );
        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.report.blocked_threshold, 10);
        assert_eq!(config.report.top_numbers, 10);
        assert_eq!(
            config.report.classification_policy,
            ClassificationPolicy::MostRecent
        );
        assert_eq!(config.classifier.spam_min_reporters, 2);
    }

    #[test]
    fn test_merge_report_args() {
        let mut config = Config::default();
        let args = ReportArgs {
            source: SourceArgs {
                input: vec![PathBuf::from("scans.json")],
                endpoint: None,
                timeout: Some(5),
            },
            output: Some(PathBuf::from("out.json")),
            format: OutputFormat::Json,
            blocked_threshold: Some(3),
            policy: Some(ClassificationPolicy::MostRecent),
            search: None,
            fail_on_blocked: false,
        };

        config.merge_report(&args);

        assert_eq!(config.source.inputs, vec!["scans.json"]);
        assert_eq!(config.source.timeout_seconds, 5);
        assert_eq!(config.general.output, "out.json");
        assert_eq!(config.report.blocked_threshold, 3);
        assert_eq!(
            config.report.classification_policy,
            ClassificationPolicy::MostRecent
        );
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("[classifier]"));
    }
}
