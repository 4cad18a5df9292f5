//! SpamShield - spam call report aggregation
//!
//! A CLI tool that aggregates phone-number scan records into an admin
//! dashboard, verifies numbers against community reports, and lists
//! per-user scan history.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad input, unreachable store, config failure, etc.)
//!   2 - Blocked numbers found with --fail-on-blocked

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod store;

use analysis::{PhoneClassifier, ReportClassifier};
use anyhow::{Context, Result};
use cli::{ActivityArgs, Cli, Commands, OutputFormat, ReportArgs, VerifyArgs};
use config::{Config, CONFIG_FILE_NAME};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // No logging needed to write a config file
    if let Commands::InitConfig = cli.command {
        return handle_init_config();
    }

    let mut config = load_config(&cli)?;
    config.merge_with_args(&cli);

    init_logging(&cli, &config);

    info!("SpamShield v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", cli);

    let outcome = match cli.command {
        Commands::Report(ref args) => run_report(args, config, cli.quiet).await,
        Commands::Verify(ref args) => run_verify(args, config, cli.quiet).await,
        Commands::Activity(ref args) => run_activity(args, config, cli.quiet).await,
        Commands::InitConfig => Ok(0),
    };

    match outcome {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle `init-config`: generate a default .spamshield.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set sources, thresholds, and the classification policy.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(cli: &Cli, config: &Config) {
    let level = if config.general.verbose && !cli.quiet {
        tracing::Level::DEBUG
    } else {
        cli.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Build the dashboard report and write it out. Returns exit code (0 or 2).
async fn run_report(args: &ReportArgs, mut config: Config, quiet: bool) -> Result<i32> {
    let start_time = Instant::now();
    config.merge_report(args);

    if !quiet {
        println!("📥 Loading scan records...");
    }
    let loaded = store::load(&config.source, !quiet)
        .await
        .context("Failed to load scan records")?;

    let options = report::ReportOptions {
        policy: config.report.classification_policy,
        blocked_threshold: config.report.blocked_threshold,
        search: args.search.clone(),
    };
    let report = report::build_report(&loaded.records, loaded.sources, &options, start_time);
    let stats = report.stats;

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, config.report.top_numbers),
    };

    let output_path = Path::new(&config.general.output);
    report::write_output(&output, output_path)?;

    if !quiet {
        println!("\n📊 Dashboard Summary:");
        println!("   Scan records: {}", report.metadata.records_loaded);
        println!("   Users: {}", stats.total_users);
        println!("   Unique numbers: {}", stats.unique_numbers);
        println!(
            "   🔴 Spam detected: {} | ⛔ Blocked: {}",
            stats.spam_detected, stats.blocked_numbers
        );
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    let exit_code = report::exit_code(&report, args.fail_on_blocked);
    if exit_code == report::EXIT_BLOCKED {
        eprintln!(
            "\n⛔ {} numbers exceed {} reports. Failing (exit code {}).",
            stats.blocked_numbers, options.blocked_threshold, exit_code
        );
    }

    Ok(exit_code)
}

/// Verify a single phone number against the loaded reports.
async fn run_verify(args: &VerifyArgs, mut config: Config, quiet: bool) -> Result<i32> {
    config.merge_source(&args.source);

    let loaded = store::load(&config.source, !quiet)
        .await
        .context("Failed to load scan records")?;
    let summaries = analysis::aggregate_with(&loaded.records, config.report.classification_policy);

    let classifier = ReportClassifier::new(&loaded.records, &summaries, (&config.classifier).into());
    let result = classifier.classify(&args.number);
    info!(
        "Verified {}: {} ({} reports)",
        result.phone_number, result.status, result.report_count
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", report::render_verification(&result));
    }

    Ok(0)
}

/// List one user's scans, newest first.
async fn run_activity(args: &ActivityArgs, mut config: Config, quiet: bool) -> Result<i32> {
    config.merge_source(&args.source);

    let loaded = store::load(&config.source, !quiet)
        .await
        .context("Failed to load scan records")?;

    let mut scans = analysis::user_activity(&loaded.records, &args.user);
    if let Some(limit) = args.limit {
        scans.truncate(limit);
    }

    if scans.is_empty() {
        warn!("No scans found for user {}", args.user);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scans)?);
    } else {
        print!("{}", report::render_activity(&args.user, &scans));
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = cli.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
