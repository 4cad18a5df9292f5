//! Scan report aggregation and dashboard statistics.
//!
//! This module turns a flat log of scan records into one summary per
//! phone number, and derives the admin dashboard views from those
//! summaries.

use crate::models::{
    ClassificationPolicy, DashboardStats, PhoneReportSummary, ReportedNumber, ScanRecord,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Per-number state while the log is being folded.
struct Accumulator<'a> {
    report_count: usize,
    reporters: HashSet<&'a str>,
    last_reported_at: Option<DateTime<Utc>>,
    classification: Option<&'a str>,
}

impl<'a> Accumulator<'a> {
    fn new() -> Self {
        Self {
            report_count: 0,
            reporters: HashSet::new(),
            last_reported_at: None,
            classification: None,
        }
    }

    fn observe(&mut self, record: &'a ScanRecord, policy: ClassificationPolicy) {
        self.report_count += 1;
        self.reporters.insert(record.user_id.as_str());

        if self.classification.is_none() {
            self.classification = Some(record.result.as_str());
        }

        if let Some(created_at) = record.created_at {
            let newer = match self.last_reported_at {
                None => true,
                Some(last) => created_at > last,
            };
            if newer {
                self.last_reported_at = Some(created_at);
                if policy == ClassificationPolicy::MostRecent {
                    self.classification = Some(record.result.as_str());
                }
            }
        }
    }

    fn finish(self, phone_number: &str) -> PhoneReportSummary {
        PhoneReportSummary {
            phone_number: phone_number.to_string(),
            report_count: self.report_count,
            distinct_reporter_count: self.reporters.len(),
            last_reported_at: self.last_reported_at,
            latest_classification: self.classification.unwrap_or_default().to_string(),
        }
    }
}

/// Group scan records by exact phone number.
///
/// The first record seen for a number decides its classification.
#[allow(dead_code)] // The binary goes through aggregate_with with a configured policy
pub fn aggregate(records: &[ScanRecord]) -> HashMap<String, PhoneReportSummary> {
    aggregate_with(records, ClassificationPolicy::FirstSeen)
}

/// Group scan records by exact phone number using the given classification policy.
pub fn aggregate_with(
    records: &[ScanRecord],
    policy: ClassificationPolicy,
) -> HashMap<String, PhoneReportSummary> {
    let mut groups: HashMap<&str, Accumulator<'_>> = HashMap::new();

    for record in records {
        groups
            .entry(record.phone_number.as_str())
            .or_insert_with(Accumulator::new)
            .observe(record, policy);
    }

    groups
        .into_iter()
        .map(|(phone, acc)| (phone.to_string(), acc.finish(phone)))
        .collect()
}

/// Newest first, records without a timestamp last.
fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order records newest first, the way the scan store returns them.
///
/// The sort is stable, so records with equal or missing timestamps keep
/// their relative order.
pub fn sort_newest_first(records: &mut [ScanRecord]) {
    records.sort_by(|a, b| newest_first(a.created_at, b.created_at));
}

/// Build the reported numbers table, most recently reported first.
pub fn reported_numbers(
    summaries: &HashMap<String, PhoneReportSummary>,
    blocked_threshold: usize,
) -> Vec<ReportedNumber> {
    let mut rows: Vec<ReportedNumber> = summaries
        .values()
        .cloned()
        .map(|summary| ReportedNumber::new(summary, blocked_threshold))
        .collect();

    rows.sort_by(|a, b| {
        newest_first(a.summary.last_reported_at, b.summary.last_reported_at)
            .then_with(|| a.summary.phone_number.cmp(&b.summary.phone_number))
    });

    rows
}

/// Compute the dashboard headline numbers.
pub fn dashboard_stats(
    records: &[ScanRecord],
    summaries: &HashMap<String, PhoneReportSummary>,
    blocked_threshold: usize,
) -> DashboardStats {
    let users: HashSet<&str> = records.iter().map(|r| r.user_id.as_str()).collect();

    DashboardStats {
        total_users: users.len(),
        total_scans: summaries.values().map(|s| s.report_count).sum(),
        unique_numbers: summaries.len(),
        spam_detected: summaries.values().filter(|s| s.is_spam()).count(),
        blocked_numbers: summaries
            .values()
            .filter(|s| s.report_count > blocked_threshold)
            .count(),
    }
}

/// Keep rows whose phone number contains `term` verbatim.
pub fn filter_numbers<'a>(rows: &'a [ReportedNumber], term: &str) -> Vec<&'a ReportedNumber> {
    rows.iter()
        .filter(|row| row.summary.phone_number.contains(term))
        .collect()
}

/// A single user's scans, newest first.
pub fn user_activity<'a>(records: &'a [ScanRecord], user_id: &str) -> Vec<&'a ScanRecord> {
    let mut scans: Vec<&ScanRecord> = records.iter().filter(|r| r.user_id == user_id).collect();
    scans.sort_by(|a, b| newest_first(a.created_at, b.created_at));
    scans
}

/// The `n` most reported numbers.
pub fn most_reported(rows: &[ReportedNumber], n: usize) -> Vec<&ReportedNumber> {
    let mut sorted: Vec<&ReportedNumber> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        b.summary
            .report_count
            .cmp(&a.summary.report_count)
            .then_with(|| a.summary.phone_number.cmp(&b.summary.phone_number))
    });
    sorted.truncate(n);
    sorted
}
