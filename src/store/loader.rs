//! Loading scan records from exported files.
//!
//! Exports are either a JSON array of records (`.json`) or one record
//! per line (`.jsonl` / `.ndjson`). Directories are searched for both.

use crate::error::{StoreError, StoreResult};
use crate::models::ScanRecord;
use futures::future::try_join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Layout of an export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// A single JSON array of records
    Json,
    /// One JSON record per line
    JsonLines,
}

impl ExportFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(ExportFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                Some(ExportFormat::JsonLines)
            }
            _ => None,
        }
    }
}

/// Parse a JSON array export.
pub fn parse_json(content: &str, source_name: &str) -> StoreResult<Vec<ScanRecord>> {
    serde_json::from_str(content).map_err(|source| StoreError::Parse {
        source_name: source_name.to_string(),
        line: None,
        source,
    })
}

/// Parse a JSON Lines export. Blank lines are skipped.
pub fn parse_json_lines(content: &str, source_name: &str) -> StoreResult<Vec<ScanRecord>> {
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = serde_json::from_str(line).map_err(|source| StoreError::Parse {
            source_name: source_name.to_string(),
            line: Some(idx + 1),
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Parse export content in the given format.
pub fn parse_export(
    content: &str,
    format: ExportFormat,
    source_name: &str,
) -> StoreResult<Vec<ScanRecord>> {
    match format {
        ExportFormat::Json => parse_json(content, source_name),
        ExportFormat::JsonLines => parse_json_lines(content, source_name),
    }
}

/// Expand the given paths into a sorted list of export files.
///
/// Files are taken as-is but must have a supported extension. Directories
/// are walked recursively, skipping hidden entries.
pub fn discover_exports(paths: &[PathBuf]) -> StoreResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            walk_dir(path, &mut found)?;
            found.sort();
            debug!("Found {} export files in {}", found.len(), path.display());
            files.extend(found);
        } else if ExportFormat::from_path(path).is_some() {
            files.push(path.clone());
        } else {
            return Err(StoreError::UnsupportedFormat(path.display().to_string()));
        }
    }

    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> StoreResult<()> {
    let entries = fs::read_dir(dir).map_err(|source| StoreError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();

        if name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            walk_dir(&path, files)?;
        } else if path.is_file() && ExportFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }

    Ok(())
}

async fn load_file(path: PathBuf, progress: Option<ProgressBar>) -> StoreResult<Vec<ScanRecord>> {
    let source_name = path.display().to_string();
    let format = ExportFormat::from_path(&path)
        .ok_or_else(|| StoreError::UnsupportedFormat(source_name.clone()))?;

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| StoreError::Io {
            path: source_name.clone(),
            source,
        })?;

    let records = parse_export(&content, format, &source_name)?;
    debug!("Loaded {} records from {}", records.len(), source_name);

    if let Some(pb) = progress {
        pb.inc(1);
    }

    Ok(records)
}

/// Load every record from the given files and directories.
///
/// Files are read concurrently; records keep file order, then in-file order.
pub async fn load_records(paths: &[PathBuf], show_progress: bool) -> StoreResult<Vec<ScanRecord>> {
    let files = discover_exports(paths)?;
    info!("Loading scan records from {} files", files.len());

    let progress = if show_progress && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let batches = try_join_all(
        files
            .into_iter()
            .map(|path| load_file(path, progress.clone())),
    )
    .await?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(batches.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const JSON_EXPORT: &str = r#"[
        {"id": "1", "phone_number": "555-1111", "user_id": "u1", "result": "Spam", "created_at": "2024-01-01T00:00:00Z"},
        {"id": "2", "phone_number": "555-2222", "user_id": "u2", "result": "Safe", "created_at": "2024-01-02T00:00:00Z"}
    ]"#;

    const JSONL_EXPORT: &str = "{\"phone_number\": \"555-3333\", \"user_id\": \"u1\", \"result\": \"Suspicious\"}\n\n{\"phone_number\": \"555-1111\", \"user_id\": \"u3\", \"result\": \"Spam\"}\n";

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ExportFormat::from_path(Path::new("a.json")),
            Some(ExportFormat::Json)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("a.JSONL")),
            Some(ExportFormat::JsonLines)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("a.ndjson")),
            Some(ExportFormat::JsonLines)
        );
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")), None);
    }

    #[test]
    fn test_parse_json() {
        let records = parse_json(JSON_EXPORT, "scans.json").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("1"));
        assert_eq!(records[1].phone_number, "555-2222");
    }

    #[test]
    fn test_parse_json_integer_ids() {
        let content = r#"[
            {"id": 17, "phone_number": "1", "user_id": "u1", "result": "Spam"},
            {"id": null, "phone_number": "2", "user_id": "u1", "result": "Safe"}
        ]"#;
        let records = parse_json(content, "scans.json").unwrap();

        assert_eq!(records[0].id.as_deref(), Some("17"));
        assert_eq!(records[1].id, None);
    }

    #[test]
    fn test_parse_json_lines_skips_blank_lines() {
        let records = parse_json_lines(JSONL_EXPORT, "scans.jsonl").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].result, "Suspicious");
        assert_eq!(records[0].created_at, None);
    }

    #[test]
    fn test_parse_json_lines_reports_line() {
        let content = "{\"phone_number\": \"1\", \"user_id\": \"u\", \"result\": \"Safe\"}\n{\"user_id\": \"u\", \"result\": \"Safe\"}\n";
        let err = parse_json_lines(content, "bad.jsonl").unwrap_err();

        match err {
            StoreError::Parse { line, .. } => assert_eq!(line, Some(2)),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_discover_exports_rejects_unknown_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scans.csv");
        fs::write(&path, "phone,user").unwrap();

        assert!(matches!(
            discover_exports(&[path]),
            Err(StoreError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_discover_exports_walks_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("2024");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a.json"), "[]").unwrap();
        fs::write(nested.join("b.jsonl"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        fs::write(dir.path().join(".hidden.json"), "[]").unwrap();

        let files = discover_exports(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.ends_with("a.json")));
        assert!(files.iter().any(|f| f.ends_with("2024/b.jsonl")));
    }

    #[tokio::test]
    async fn test_load_records_from_files() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("a.json");
        let jsonl = dir.path().join("b.jsonl");
        fs::write(&json, JSON_EXPORT).unwrap();
        fs::write(&jsonl, JSONL_EXPORT).unwrap();

        let records = load_records(&[json, jsonl], false).await.unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].phone_number, "555-1111");
        assert_eq!(records[2].phone_number, "555-3333");
    }

    #[test]
    fn test_load_records_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.json");

        let result = tokio_test::block_on(load_records(&[missing], false));
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
