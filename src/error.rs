//! Typed errors for loading scan records.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scan record in {source_name}{}: {source}", line_suffix(.line))]
    Parse {
        source_name: String,
        line: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported scan export format: {0} (expected .json, .jsonl or .ndjson)")]
    UnsupportedFormat(String),

    #[error("Request to scan store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scan store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Missing API key: set the {0} environment variable")]
    MissingApiKey(String),

    #[error("No scan source configured: pass --input or --endpoint")]
    NoSource,
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" (line {})", n),
        None => String::new(),
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_mentions_line() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StoreError::Parse {
            source_name: "scans.jsonl".to_string(),
            line: Some(3),
            source,
        };

        let message = err.to_string();
        assert!(message.contains("scans.jsonl (line 3)"));
    }

    #[test]
    fn test_status_error_message() {
        let err = StoreError::Status {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(err.to_string(), "Scan store returned 401: invalid api key");
    }
}
