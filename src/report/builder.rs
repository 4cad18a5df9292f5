//! Dashboard report assembly.
//!
//! Turns loaded scan records into a [`Report`] and decides the process
//! exit code for `--fail-on-blocked`.

use crate::analysis;
use crate::models::{ClassificationPolicy, Report, ReportMetadata, ScanRecord};
use chrono::Utc;
use std::time::Instant;
use tracing::info;

/// Exit code when `--fail-on-blocked` finds a blocked number.
pub const EXIT_BLOCKED: i32 = 2;

/// Options controlling how a dashboard report is assembled.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Which record decides a number's classification.
    pub policy: ClassificationPolicy,
    /// Report count above which a number is blocked.
    pub blocked_threshold: usize,
    /// Only list numbers containing this term. Stats are not filtered.
    pub search: Option<String>,
}

/// Aggregate `records` and assemble the dashboard report.
pub fn build_report(
    records: &[ScanRecord],
    sources: Vec<String>,
    options: &ReportOptions,
    started: Instant,
) -> Report {
    let threshold = options.blocked_threshold;

    let summaries = analysis::aggregate_with(records, options.policy);
    let stats = analysis::dashboard_stats(records, &summaries, threshold);
    let mut numbers = analysis::reported_numbers(&summaries, threshold);

    if let Some(ref term) = options.search {
        let total = numbers.len();
        numbers = analysis::filter_numbers(&numbers, term)
            .into_iter()
            .cloned()
            .collect();
        info!(
            "Showing {} of {} reported numbers matching {:?}",
            numbers.len(),
            total,
            term
        );
    }

    Report {
        metadata: ReportMetadata {
            sources,
            generated_at: Utc::now(),
            records_loaded: records.len(),
            classification_policy: options.policy,
            blocked_threshold: threshold,
            duration_seconds: started.elapsed().as_secs_f64(),
        },
        stats,
        numbers,
    }
}

/// Exit code for a finished report: 2 when failing on blocked numbers, else 0.
pub fn exit_code(report: &Report, fail_on_blocked: bool) -> i32 {
    if fail_on_blocked && report.stats.blocked_numbers > 0 {
        EXIT_BLOCKED
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_timestamp;

    fn reports(phone: &str, count: usize) -> Vec<ScanRecord> {
        (0..count)
            .map(|i| {
                ScanRecord::new(
                    phone,
                    format!("u{}", i),
                    "Spam",
                    parse_timestamp("2024-01-01T00:00:00Z"),
                )
            })
            .collect()
    }

    fn options(search: Option<&str>) -> ReportOptions {
        ReportOptions {
            policy: ClassificationPolicy::FirstSeen,
            blocked_threshold: 5,
            search: search.map(String::from),
        }
    }

    fn build(records: &[ScanRecord], search: Option<&str>) -> Report {
        build_report(
            records,
            vec!["scans.json".to_string()],
            &options(search),
            Instant::now(),
        )
    }

    #[test]
    fn test_blocked_threshold_boundary() {
        let mut records = reports("555-0005", 5);
        records.extend(reports("555-0006", 6));
        let report = build(&records, None);

        let blocked = |phone: &str| {
            report
                .numbers
                .iter()
                .find(|n| n.summary.phone_number == phone)
                .map(|n| n.blocked)
        };
        assert_eq!(blocked("555-0005"), Some(false));
        assert_eq!(blocked("555-0006"), Some(true));
        assert_eq!(report.stats.blocked_numbers, 1);
        assert_eq!(report.metadata.records_loaded, 11);
    }

    #[test]
    fn test_fail_on_blocked_exit_code() {
        let at_threshold = build(&reports("555-0005", 5), None);
        assert_eq!(exit_code(&at_threshold, true), 0);

        let over = build(&reports("555-0006", 6), None);
        assert_eq!(exit_code(&over, true), EXIT_BLOCKED);
        assert_eq!(exit_code(&over, false), 0);
    }

    #[test]
    fn test_search_filters_numbers_not_stats() {
        let mut records = reports("555-1111", 6);
        records.extend(reports("555-2222", 1));
        let report = build(&records, Some("2222"));

        assert_eq!(report.numbers.len(), 1);
        assert_eq!(report.numbers[0].summary.phone_number, "555-2222");
        assert_eq!(report.stats.unique_numbers, 2);
        assert_eq!(report.stats.total_scans, 7);
        assert_eq!(report.stats.blocked_numbers, 1);
        assert_eq!(exit_code(&report, true), EXIT_BLOCKED);
    }

    #[test]
    fn test_empty_log() {
        let report = build(&[], None);

        assert!(report.numbers.is_empty());
        assert_eq!(report.stats.total_scans, 0);
        assert_eq!(exit_code(&report, true), 0);
    }
}
