//! Per-session metrics storage
//!
//! Layout under the sessions directory:
//!
//! ```text
//! <sessions>/<session-slug>/metrics.json          JSON array of MetricsRecord
//! <sessions>/<session-slug>/metrics_summary.json  SummaryFile, rewritten on every append
//! ```
//!
//! Appends to one session must be serialized by the caller.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{EvalError, Result};
use crate::metrics::{deserialize_timestamp, MetricsRecord};
use crate::summary::{summarize, SessionSummary};

pub const METRICS_FILE: &str = "metrics.json";
pub const SUMMARY_FILE: &str = "metrics_summary.json";

/// Contents of `metrics_summary.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryFile {
    pub session_id: String,
    pub total_entries: usize,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_updated: DateTime<Utc>,
    pub summary: SessionSummary,
}

/// Outcome of refreshing every session's summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub updated: Vec<String>,
    /// Session directories without a metrics log
    pub skipped: Vec<String>,
    /// Session name and reason
    pub failed: Vec<(String, String)>,
}

/// Flat-file store of session metrics logs
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a session id
    pub fn session_dir(&self, session_id: &str) -> Result<PathBuf> {
        let slug = slug::slugify(session_id);
        if slug.is_empty() {
            return Err(EvalError::invalid_value("session id", session_id));
        }
        Ok(self.root.join(slug))
    }

    /// Append a record and rewrite the session summary.
    ///
    /// A metrics log that is not valid JSON is moved aside and a new log is
    /// started. Read failures are returned.
    pub fn append(&self, session_id: &str, record: MetricsRecord) -> Result<SummaryFile> {
        let dir = self.session_dir(session_id)?;
        fs::create_dir_all(&dir)
            .map_err(|e| EvalError::io_operation("create session directory", dir.display(), e))?;

        let metrics_path = dir.join(METRICS_FILE);
        let mut records = match read_log(&metrics_path) {
            Ok(records) => records,
            Err(EvalError::Json(e)) => {
                let moved = quarantine(&metrics_path)?;
                warn!(
                    path = %metrics_path.display(),
                    moved_to = %moved.display(),
                    error = %e,
                    "metrics log is not valid JSON, starting a new one"
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        records.push(record);

        write_json_atomic(&metrics_path, &records)?;
        debug!(session = session_id, entries = records.len(), "appended metrics");

        write_summary(&dir, &records)
    }

    /// Load a session's metrics log
    pub fn load(&self, session_id: &str) -> Result<Vec<MetricsRecord>> {
        let path = self.session_dir(session_id)?.join(METRICS_FILE);
        if !path.is_file() {
            return Err(EvalError::SessionNotFound {
                id: session_id.to_string(),
            });
        }
        read_log(&path)
    }

    /// Session directory names that hold a metrics log, sorted
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut sessions: Vec<String> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir() && e.path().join(METRICS_FILE).is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        sessions.sort();
        Ok(sessions)
    }

    /// Recompute and rewrite one session's summary
    pub fn refresh(&self, session_id: &str) -> Result<SummaryFile> {
        let records = self.load(session_id)?;
        write_summary(&self.session_dir(session_id)?, &records)
    }

    /// Recompute the summary of every session directory.
    ///
    /// Directories without a metrics log, or with an empty one, are skipped.
    pub fn refresh_all(&self) -> Result<RefreshReport> {
        let mut report = RefreshReport::default();
        if !self.root.is_dir() {
            return Ok(report);
        }

        let mut dirs: Vec<(String, PathBuf)> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| {
                (
                    e.file_name().to_string_lossy().into_owned(),
                    e.path().to_path_buf(),
                )
            })
            .collect();
        dirs.sort();

        for (name, dir) in dirs {
            let metrics_path = dir.join(METRICS_FILE);
            if !metrics_path.is_file() {
                report.skipped.push(name);
                continue;
            }
            let result = read_log(&metrics_path).and_then(|records| {
                if records.is_empty() {
                    Ok(None)
                } else {
                    write_summary(&dir, &records).map(Some)
                }
            });
            match result {
                Ok(Some(_)) => report.updated.push(name),
                Ok(None) => report.skipped.push(name),
                Err(e) => {
                    warn!(session = %name, error = %e, "failed to refresh summary");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

/// Rewrite a session's summary. The session id is the directory name.
fn write_summary(dir: &Path, records: &[MetricsRecord]) -> Result<SummaryFile> {
    let session_id = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = SummaryFile {
        session_id,
        total_entries: records.len(),
        last_updated: Utc::now(),
        summary: summarize(records),
    };
    write_json_atomic(&dir.join(SUMMARY_FILE), &file)?;
    Ok(file)
}

fn read_log(path: &Path) -> Result<Vec<MetricsRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .map_err(|e| EvalError::io_operation("read metrics log", path.display(), e))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records = serde_json::from_str(&content)?;
    Ok(records)
}

/// Move an unreadable log to `metrics.json.corrupt-<timestamp>`
fn quarantine(path: &Path) -> Result<PathBuf> {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3f")));
    let target = PathBuf::from(name);
    fs::rename(path, &target)
        .map_err(|e| EvalError::io_operation("move aside", path.display(), e))?;
    Ok(target)
}

/// Write pretty-printed JSON through a temp file and rename
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp = PathBuf::from(temp_name);

    let file = fs::File::create(&temp)
        .map_err(|e| EvalError::io_operation("create", temp.display(), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    drop(writer);

    fs::rename(&temp, path)
        .map_err(|e| EvalError::io_operation("replace", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetInfo;
    use crate::metrics::compute_metrics;
    use crate::outcome::ExecutionOutcome;
    use tempfile::tempdir;

    fn record(model: &str) -> MetricsRecord {
        compute_metrics(
            "What is the total sales?",
            "result = df['sales'].sum()",
            ExecutionOutcome::Number(10.0),
            &DatasetInfo::none(),
            model,
            Some(0.01),
            Vec::new(),
        )
    }

    #[test]
    fn test_append_creates_log_and_summary() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.append("Session 1", record("a")).unwrap();
        let summary = store.append("Session 1", record("b")).unwrap();

        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.summary.models_used, vec!["a", "b"]);

        let session_dir = dir.path().join("session-1");
        assert!(session_dir.join(METRICS_FILE).is_file());
        assert!(session_dir.join(SUMMARY_FILE).is_file());
        assert!(!session_dir.join("metrics.json.tmp").exists());

        let log = store.load("Session 1").unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].model, "a");
    }

    #[test]
    fn test_log_is_pretty_json_array() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.append("s", record("a")).unwrap();

        let content = fs::read_to_string(dir.path().join("s").join(METRICS_FILE)).unwrap();
        assert!(content.starts_with("[\n"));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_log_starts_over() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session_dir = dir.path().join("s");
        fs::create_dir_all(&session_dir).unwrap();
        fs::write(session_dir.join(METRICS_FILE), "{not json").unwrap();

        let summary = store.append("s", record("a")).unwrap();
        assert_eq!(summary.total_entries, 1);
        assert_eq!(store.load("s").unwrap().len(), 1);

        let moved: Vec<String> = fs::read_dir(&session_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("metrics.json.corrupt-"))
            .collect();
        assert_eq!(moved.len(), 1);
        assert_eq!(
            fs::read_to_string(session_dir.join(&moved[0])).unwrap(),
            "{not json"
        );
    }

    #[test]
    fn test_unreadable_log_is_left_in_place() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let log_path = dir.path().join("s").join(METRICS_FILE);
        fs::create_dir_all(&log_path).unwrap();

        let err = store.append("s", record("a")).unwrap_err();
        assert!(matches!(err, EvalError::FailedOperationWithTarget { .. }));
        assert!(log_path.is_dir());
    }

    #[test]
    fn test_append_onto_log_with_naive_timestamp() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.append("legacy", record("a")).unwrap();

        let path = dir.path().join("legacy").join(METRICS_FILE);
        let mut log: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        log[0]["timestamp"] = serde_json::json!("2025-11-20T14:03:12.123456");
        fs::write(&path, serde_json::to_string_pretty(&log).unwrap()).unwrap();

        let loaded = store.load("legacy").unwrap();
        assert_eq!(
            loaded[0].timestamp.to_rfc3339(),
            "2025-11-20T14:03:12.123456+00:00"
        );

        let summary = store.append("legacy", record("b")).unwrap();
        assert_eq!(summary.total_entries, 2);
        assert_eq!(store.load("legacy").unwrap()[0].model, "a");
    }

    #[test]
    fn test_empty_log_is_skipped_by_refresh_all() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        fs::create_dir_all(dir.path().join("blank")).unwrap();
        fs::write(dir.path().join("blank").join(METRICS_FILE), "[]").unwrap();

        let report = store.refresh_all().unwrap();
        assert!(report.updated.is_empty());
        assert_eq!(report.skipped, vec!["blank"]);
        assert!(!dir.path().join("blank").join(SUMMARY_FILE).exists());
    }

    #[test]
    fn test_summary_uses_directory_name_as_session_id() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let appended = store.append("My Session", record("a")).unwrap();
        let refreshed = store.refresh("My Session").unwrap();
        store.refresh_all().unwrap();
        let on_disk: SummaryFile = serde_json::from_str(
            &fs::read_to_string(dir.path().join("my-session").join(SUMMARY_FILE)).unwrap(),
        )
        .unwrap();

        assert_eq!(appended.session_id, "my-session");
        assert_eq!(refreshed.session_id, "my-session");
        assert_eq!(on_disk.session_id, "my-session");
    }

    #[test]
    fn test_missing_session() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let err = store.load("nope").unwrap_err();
        assert!(matches!(err, EvalError::SessionNotFound { .. }));
    }

    #[test]
    fn test_unusable_session_id() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.session_dir("!!!").is_err());
    }

    #[test]
    fn test_list_and_refresh_all() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.append("beta", record("a")).unwrap();
        store.append("alpha", record("a")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::create_dir_all(dir.path().join("broken")).unwrap();
        fs::write(dir.path().join("broken").join(METRICS_FILE), "[1, 2").unwrap();
        fs::remove_file(dir.path().join("alpha").join(SUMMARY_FILE)).unwrap();

        assert_eq!(store.list_sessions().unwrap(), vec!["alpha", "beta", "broken"]);

        let report = store.refresh_all().unwrap();
        assert_eq!(report.updated, vec!["alpha", "beta"]);
        assert_eq!(report.skipped, vec!["empty"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert!(dir.path().join("alpha").join(SUMMARY_FILE).is_file());
    }

    #[test]
    fn test_refresh_one_session() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.append("s", record("a")).unwrap();
        fs::remove_file(dir.path().join("s").join(SUMMARY_FILE)).unwrap();

        let summary = store.refresh("s").unwrap();
        assert_eq!(summary.session_id, "s");
        assert_eq!(summary.total_entries, 1);
        assert!(dir.path().join("s").join(SUMMARY_FILE).is_file());
        assert!(matches!(
            store.refresh("other").unwrap_err(),
            EvalError::SessionNotFound { .. }
        ));
    }

    #[test]
    fn test_refresh_all_without_root() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("missing"));
        assert_eq!(store.refresh_all().unwrap(), RefreshReport::default());
        assert!(store.list_sessions().unwrap().is_empty());
    }
}
