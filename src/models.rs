//! Data models for SpamShield.
//!
//! This module contains the core data structures used throughout
//! the application: scan records as stored by the backend, the
//! per-number summaries derived from them, and the dashboard report.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// One logged phone-number check, as produced by the scan store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Row identifier in the store, if exported. Integer keys load as text.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_id"
    )]
    pub id: Option<String>,
    /// Phone number exactly as the user typed it (not normalized).
    #[serde(alias = "phoneNumber")]
    pub phone_number: String,
    /// Opaque identifier of the user who ran the scan.
    #[serde(alias = "userId")]
    pub user_id: String,
    /// Free-text classification label, e.g. "Spam" or "Safe".
    pub result: String,
    /// When the scan happened. Unparseable values load as `None`.
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "deserialize_lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl ScanRecord {
    /// Creates a record with the given fields and no row id.
    #[allow(dead_code)] // Builder used by tests and fixtures
    pub fn new(
        phone_number: impl Into<String>,
        user_id: impl Into<String>,
        result: impl Into<String>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: None,
            phone_number: phone_number.into(),
            user_id: user_id.into(),
            result: result.into(),
            created_at,
        }
    }
}

/// Parse a store timestamp.
///
/// Accepts RFC 3339 and the `YYYY-MM-DD HH:MM:SS[.f][+HH[:MM]]` text form
/// emitted for `timestamptz` columns. Values without an offset are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Deserialize a timestamp that may be missing, null, malformed, or epoch millis.
fn deserialize_lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;

    Ok(match raw {
        Some(Value::String(s)) => parse_timestamp(&s),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

/// Deserialize a row id stored as either text or an integer key.
fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;

    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Classification verdict for a phone number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// No credible reports against the number
    Safe,
    /// A few reports, answer with caution
    Suspicious,
    /// Known spam, should be blocked
    Spam,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Safe => write!(f, "Safe"),
            Verdict::Suspicious => write!(f, "Suspicious"),
            Verdict::Spam => write!(f, "Spam"),
        }
    }
}

impl Verdict {
    /// Returns an emoji representation of the verdict.
    pub fn emoji(&self) -> &'static str {
        match self {
            Verdict::Safe => "🟢",
            Verdict::Suspicious => "🟡",
            Verdict::Spam => "🔴",
        }
    }

    /// Short advice line shown next to a verification result.
    pub fn advice(&self) -> &'static str {
        match self {
            Verdict::Safe => "This number has not been reported as spam by the community.",
            Verdict::Suspicious => "This number has a few reports. Answer with caution.",
            Verdict::Spam => "Block this number to avoid scam attempts.",
        }
    }

    /// Interpret a free-text scan label.
    ///
    /// Matching is a case-insensitive substring test, "spam" taking
    /// precedence over "suspicious" over "safe".
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        if label.contains("spam") {
            Some(Verdict::Spam)
        } else if label.contains("suspicious") {
            Some(Verdict::Suspicious)
        } else if label.contains("safe") {
            Some(Verdict::Safe)
        } else {
            None
        }
    }
}

/// Which record's `result` becomes a summary's classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationPolicy {
    /// Keep the first record seen for the number and never overwrite it
    #[default]
    FirstSeen,
    /// Follow the record with the newest timestamp
    MostRecent,
}

impl fmt::Display for ClassificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationPolicy::FirstSeen => write!(f, "first-seen"),
            ClassificationPolicy::MostRecent => write!(f, "most-recent"),
        }
    }
}

/// Aggregate view over all scan records sharing a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneReportSummary {
    /// Grouping key, compared by exact string equality.
    pub phone_number: String,
    /// Number of records for this phone number.
    pub report_count: usize,
    /// Number of distinct users among those records.
    pub distinct_reporter_count: usize,
    /// Newest timestamp in the group, if any record had one.
    pub last_reported_at: Option<DateTime<Utc>>,
    /// Classification label chosen by the aggregation policy.
    pub latest_classification: String,
}

impl PhoneReportSummary {
    /// Parsed verdict of the classification label, if recognizable.
    pub fn verdict(&self) -> Option<Verdict> {
        Verdict::from_label(&self.latest_classification)
    }

    /// Whether the classification label marks the number as spam.
    pub fn is_spam(&self) -> bool {
        self.latest_classification.to_lowercase().contains("spam")
    }
}

/// Strip every non-digit character from a phone number.
pub fn digits_only(phone_number: &str) -> String {
    phone_number.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A row of the reported numbers table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedNumber {
    /// Display identifier: the phone number's digits.
    pub id: String,
    /// The underlying summary.
    #[serde(flatten)]
    pub summary: PhoneReportSummary,
    /// True when the report count exceeds the blocking threshold.
    pub blocked: bool,
}

impl ReportedNumber {
    /// Builds a row, flagging it blocked when `report_count > blocked_threshold`.
    pub fn new(summary: PhoneReportSummary, blocked_threshold: usize) -> Self {
        Self {
            id: digits_only(&summary.phone_number),
            blocked: summary.report_count > blocked_threshold,
            summary,
        }
    }
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Distinct users appearing in the scan log.
    ///
    /// Only users who ran at least one scan are counted; registered
    /// accounts without scans are not visible here.
    pub total_users: usize,
    /// Total scans across all numbers.
    pub total_scans: usize,
    /// Distinct phone numbers scanned.
    pub unique_numbers: usize,
    /// Numbers whose classification mentions spam.
    pub spam_detected: usize,
    /// Numbers over the blocking threshold.
    pub blocked_numbers: usize,
}

/// Outcome of verifying one phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// The number as queried.
    pub phone_number: String,
    /// Verdict for the number.
    pub status: Verdict,
    /// Confidence in the verdict, 0.0 to 1.0.
    pub confidence: f64,
    /// Reports found for the number.
    pub report_count: usize,
    /// Distinct users who reported it.
    pub distinct_reporters: usize,
    /// Newest report, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reported_at: Option<DateTime<Utc>>,
}

/// Metadata about a dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the scan records came from.
    pub sources: Vec<String>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of scan records aggregated.
    pub records_loaded: usize,
    /// Classification policy used for the summaries.
    pub classification_policy: ClassificationPolicy,
    /// Report count above which a number is shown as blocked.
    pub blocked_threshold: usize,
    /// Time spent loading and aggregating, in seconds.
    pub duration_seconds: f64,
}

/// The complete admin dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Headline statistics.
    pub stats: DashboardStats,
    /// Reported numbers, newest report first.
    pub numbers: Vec<ReportedNumber>,
}
