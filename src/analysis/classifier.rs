//! Phone number reputation classification.
//!
//! Verdicts are derived from the community's aggregated scan reports.

use crate::config::ClassifierConfig;
use crate::models::{digits_only, PhoneReportSummary, ScanRecord, VerificationResult, Verdict};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Something that can judge a phone number.
pub trait PhoneClassifier {
    /// Classify a phone number as typed by the user.
    fn classify(&self, phone_number: &str) -> VerificationResult;
}

/// Thresholds for [`ReportClassifier`].
#[derive(Debug, Clone, Copy)]
pub struct ClassifierThresholds {
    /// Report count at which a number is spam regardless of labels.
    pub spam_min_reports: usize,
    /// Distinct reporters needed for a spam label to count as spam.
    pub spam_min_reporters: usize,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            spam_min_reports: 6,
            spam_min_reporters: 2,
        }
    }
}

impl From<&ClassifierConfig> for ClassifierThresholds {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            spam_min_reports: config.spam_min_reports,
            spam_min_reporters: config.spam_min_reporters,
        }
    }
}

/// Classifier backed by aggregated scan reports.
///
/// The raw records are kept alongside the summaries so reporters can be
/// counted once across differently formatted keys.
pub struct ReportClassifier<'a> {
    records: &'a [ScanRecord],
    summaries: &'a HashMap<String, PhoneReportSummary>,
    thresholds: ClassifierThresholds,
}

/// Reports for one queried number, merged across differently formatted keys.
struct Evidence<'a> {
    report_count: usize,
    distinct_reporters: usize,
    last_reported_at: Option<chrono::DateTime<chrono::Utc>>,
    label: Option<Verdict>,
    newest: Option<&'a PhoneReportSummary>,
}

impl<'a> ReportClassifier<'a> {
    /// Create a classifier over `summaries`, which must be aggregated from `records`.
    pub fn new(
        records: &'a [ScanRecord],
        summaries: &'a HashMap<String, PhoneReportSummary>,
        thresholds: ClassifierThresholds,
    ) -> Self {
        Self {
            records,
            summaries,
            thresholds,
        }
    }

    /// Summaries that refer to the same number as `phone_number`.
    ///
    /// Numbers are matched on their digits so formatting differences do not
    /// hide reports. A query without digits only matches its exact key.
    fn matching(&self, phone_number: &str) -> Vec<&'a PhoneReportSummary> {
        let wanted = digits_only(phone_number);

        if wanted.is_empty() {
            return self.summaries.get(phone_number).into_iter().collect();
        }

        self.summaries
            .values()
            .filter(|s| digits_only(&s.phone_number) == wanted)
            .collect()
    }

    fn evidence(&self, phone_number: &str) -> Evidence<'a> {
        let matches = self.matching(phone_number);

        let newest = matches
            .iter()
            .copied()
            .max_by(|a, b| {
                a.last_reported_at
                    .cmp(&b.last_reported_at)
                    .then_with(|| a.report_count.cmp(&b.report_count))
            });

        // Union of reporters over every matched key
        let keys: HashSet<&str> = matches.iter().map(|s| s.phone_number.as_str()).collect();
        let reporters: HashSet<&str> = self
            .records
            .iter()
            .filter(|r| keys.contains(r.phone_number.as_str()))
            .map(|r| r.user_id.as_str())
            .collect();

        Evidence {
            report_count: matches.iter().map(|s| s.report_count).sum(),
            distinct_reporters: reporters.len(),
            last_reported_at: matches.iter().filter_map(|s| s.last_reported_at).max(),
            label: newest.and_then(|s| s.verdict()),
            newest,
        }
    }
}

impl PhoneClassifier for ReportClassifier<'_> {
    fn classify(&self, phone_number: &str) -> VerificationResult {
        let evidence = self.evidence(phone_number);

        if let Some(summary) = evidence.newest {
            debug!(
                "Matched {} against reports for {} ({} reports)",
                phone_number, summary.phone_number, evidence.report_count
            );
        }

        let status = if evidence.report_count == 0 {
            Verdict::Safe
        } else if evidence.report_count >= self.thresholds.spam_min_reports {
            Verdict::Spam
        } else {
            match evidence.label {
                Some(Verdict::Spam)
                    if evidence.distinct_reporters >= self.thresholds.spam_min_reporters =>
                {
                    Verdict::Spam
                }
                Some(Verdict::Safe) => Verdict::Safe,
                _ => Verdict::Suspicious,
            }
        };

        let confidence = match status {
            _ if evidence.report_count == 0 => 0.5,
            Verdict::Spam | Verdict::Safe => {
                (0.6 + 0.05 * evidence.report_count as f64).min(0.99)
            }
            Verdict::Suspicious => (0.5 + 0.1 * evidence.distinct_reporters as f64).min(0.9),
        };

        VerificationResult {
            phone_number: phone_number.to_string(),
            status,
            confidence,
            report_count: evidence.report_count,
            distinct_reporters: evidence.distinct_reporters,
            last_reported_at: evidence.last_reported_at,
        }
    }
}
