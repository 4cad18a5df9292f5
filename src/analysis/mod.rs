//! Analysis modules.
//!
//! Aggregation of scan records into per-number summaries, and the
//! classifier that turns those summaries into verdicts.

pub mod aggregator;
pub mod classifier;

pub use aggregator::*;
pub use classifier::{PhoneClassifier, ReportClassifier};
