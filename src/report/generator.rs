//! Markdown and JSON output generation.
//!
//! This module renders the admin dashboard report as well as the
//! console output of the `verify` and `activity` commands.

use crate::analysis::most_reported;
use crate::models::{
    DashboardStats, Report, ReportMetadata, ReportedNumber, ScanRecord, VerificationResult,
    Verdict,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "Unknown".to_string(),
    }
}

/// Escape free text for a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('`', "\\`")
}

/// Badge for a free-text classification label.
fn classification_badge(label: &str) -> String {
    let emoji = match Verdict::from_label(label) {
        Some(verdict) => verdict.emoji(),
        None => "⚪",
    };
    let label = if label.is_empty() { "Unknown" } else { label };
    format!("{} {}", emoji, label)
}

/// Generate a complete Markdown dashboard report.
pub fn generate_markdown_report(report: &Report, top_numbers: usize) -> String {
    let mut output = String::new();

    output.push_str("# SpamShield Dashboard\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report, top_numbers));
    output.push_str(&generate_stats_section(&report.stats));
    output.push_str(&generate_most_reported_section(&report.numbers, top_numbers));
    output.push_str(&generate_numbers_section(&report.numbers));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Sources:** {}\n", metadata.sources.join(", ")));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Scan Records:** {}\n",
        metadata.records_loaded
    ));
    section.push_str(&format!(
        "- **Classification Policy:** `{}`\n",
        metadata.classification_policy
    ));
    section.push_str(&format!(
        "- **Blocked Above:** {} reports\n",
        metadata.blocked_threshold
    ));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n\n",
        metadata.duration_seconds
    ));

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report, top_numbers: usize) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Overview](#overview)\n");
    if top_numbers > 0 && !report.numbers.is_empty() {
        toc.push_str("- [Most Reported Numbers](#most-reported-numbers)\n");
    }
    toc.push_str("- [Reported Numbers](#reported-numbers)\n\n");

    toc
}

/// Generate the headline statistics section.
fn generate_stats_section(stats: &DashboardStats) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str("| Users | Scans | Unique Numbers | 🔴 Spam Detected | ⛔ Blocked |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        stats.total_users,
        stats.total_scans,
        stats.unique_numbers,
        stats.spam_detected,
        stats.blocked_numbers
    ));

    section
}

/// Generate the most reported numbers section.
fn generate_most_reported_section(numbers: &[ReportedNumber], n: usize) -> String {
    let top = most_reported(numbers, n);
    if top.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Most Reported Numbers\n\n");
    section.push_str("| Phone Number | Reports |\n");
    section.push_str("|:---|:---:|\n");
    for row in top {
        section.push_str(&format!(
            "| {} | {} |\n",
            escape_cell(&row.summary.phone_number),
            row.summary.report_count
        ));
    }
    section.push('\n');

    section
}

/// Generate the reported numbers table.
fn generate_numbers_section(numbers: &[ReportedNumber]) -> String {
    let mut section = String::new();

    section.push_str("## Reported Numbers\n\n");

    if numbers.is_empty() {
        section.push_str("No reported numbers found.\n\n");
        return section;
    }

    section.push_str("| Phone Number | Reports | Classification | Last Reported | Blocked |\n");
    section.push_str("|:---|:---|:---|:---|:---:|\n");

    for row in numbers {
        section.push_str(&generate_number_row(row));
    }
    section.push('\n');

    section
}

/// Generate a single row of the reported numbers table.
fn generate_number_row(row: &ReportedNumber) -> String {
    let summary = &row.summary;

    format!(
        "| {} | {} reports by {} users | {} | {} | {} |\n",
        escape_cell(&summary.phone_number),
        summary.report_count,
        summary.distinct_reporter_count,
        escape_cell(&classification_badge(&summary.latest_classification)),
        format_timestamp(summary.last_reported_at),
        if row.blocked { "⛔ Yes" } else { "No" }
    )
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by SpamShield*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render a verification result for the console.
pub fn render_verification(result: &VerificationResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {}: {} ({:.0}% confidence)\n",
        result.status.emoji(),
        result.phone_number,
        result.status,
        result.confidence * 100.0
    ));

    if result.report_count > 0 {
        out.push_str(&format!(
            "   Reported {} times by {} users. Last reported {}.\n",
            result.report_count,
            result.distinct_reporters,
            format_timestamp(result.last_reported_at)
        ));
    }
    out.push_str(&format!("   {}\n", result.status.advice()));

    out
}

/// Render a user's scan history for the console.
pub fn render_activity(user_id: &str, scans: &[&ScanRecord]) -> String {
    let mut out = String::new();

    out.push_str(&format!("Scan history for {}\n", user_id));

    if scans.is_empty() {
        out.push_str("   No scan history for this user\n");
        return out;
    }

    for scan in scans {
        out.push_str(&format!(
            "   📞 {}  {}  {}\n",
            scan.phone_number,
            classification_badge(&scan.result),
            format_timestamp(scan.created_at)
        ));
    }

    out
}

/// Write output to a file, replacing it atomically.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
