//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::ClassificationPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// SpamShield - spam call report aggregation
///
/// Aggregate exported scan records into an admin dashboard, check a
/// phone number's reputation, or list a user's scan history.
///
/// Examples:
///   spamshield report --input scans.json
///   spamshield report --input exports/ --format json --output dashboard.json
///   spamshield verify --input scans.json "(555) 111-1111"
///   spamshield activity --endpoint https://store.example.com 7f3c9a
///   spamshield init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    ///
    /// If not specified, looks for .spamshield.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Aggregate scan records into the admin dashboard report
    Report(ReportArgs),
    /// Check a phone number against community reports
    Verify(VerifyArgs),
    /// Show one user's scan history, newest first
    Activity(ActivityArgs),
    /// Generate a default .spamshield.toml configuration file
    InitConfig,
}

/// Where to load scan records from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Scan export files or directories (.json, .jsonl, .ndjson)
    #[arg(short, long, value_name = "PATH", value_delimiter = ',')]
    pub input: Vec<PathBuf>,

    /// Base URL of the scan store's REST endpoint
    #[arg(long, value_name = "URL", env = "SPAMSHIELD_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds for the REST endpoint
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Numbers with more reports than this are shown as blocked
    #[arg(long, value_name = "COUNT")]
    pub blocked_threshold: Option<usize>,

    /// Which record decides a number's classification
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<ClassificationPolicy>,

    /// Only include numbers containing this text
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Exit with code 2 if any number is over the blocked threshold
    ///
    /// Useful for alerting pipelines.
    #[arg(long)]
    pub fail_on_blocked: bool,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Phone number to check, in any formatting
    #[arg(value_name = "NUMBER")]
    pub number: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ActivityArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// User identifier to list scans for
    #[arg(value_name = "USER_ID")]
    pub user: String,

    /// Maximum number of scans to show
    #[arg(long, value_name = "COUNT")]
    pub limit: Option<usize>,

    /// Print the scans as JSON
    #[arg(long)]
    pub json: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Commands::Report(args) => {
                args.source.validate()?;
                if args.blocked_threshold == Some(0) {
                    return Err("Blocked threshold must be at least 1".to_string());
                }
            }
            Commands::Verify(args) => {
                args.source.validate()?;
                if args.number.trim().is_empty() {
                    return Err("Phone number must not be empty".to_string());
                }
            }
            Commands::Activity(args) => {
                args.source.validate()?;
                if args.limit == Some(0) {
                    return Err("Limit must be at least 1".to_string());
                }
            }
            Commands::InitConfig => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl SourceArgs {
    /// Validate source flags that can be checked before loading.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        for path in &self.input {
            if !path.exists() {
                return Err(format!("Input path does not exist: {}", path.display()));
            }
        }

        Ok(())
    }
}
