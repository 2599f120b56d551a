//! Append-only JSON-lines file sink.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::trace;

use super::{BoxFuture, MileageSink, SinkError};
use crate::tracking::MileageRecord;

/// One line of a mileage file: the record tagged with its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMileageRecord {
    pub user_id: String,
    #[serde(flatten)]
    pub record: MileageRecord,
}

/// Sink appending one JSON object per line.
///
/// The parent directory is created on first write. Writes are serialized so
/// concurrent appends never interleave within a line.
#[derive(Debug)]
pub struct JsonlFileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_line(&self, line: String) -> Result<(), SinkError> {
        let io_err = |source: std::io::Error| SinkError::Io {
            path: self.path.clone(),
            source,
        };

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        Ok(())
    }
}

impl MileageSink for JsonlFileSink {
    fn append<'a>(
        &'a self,
        record: &'a MileageRecord,
        user_id: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            let stored = StoredMileageRecord {
                user_id: user_id.to_string(),
                record: record.clone(),
            };
            let mut line = serde_json::to_string(&stored)?;
            line.push('\n');
            self.write_line(line).await?;
            trace!(path = %self.path.display(), jurisdiction = %record.jurisdiction, "Appended mileage record");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(code: &str, miles: f64) -> MileageRecord {
        MileageRecord {
            jurisdiction: code.into(),
            miles,
            occurred_at: Utc.with_ymd_and_hms(2025, 2, 10, 14, 0, 0).unwrap(),
            endpoint: Coordinate::new(39.0, -104.0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("mileage.jsonl");
        let sink = JsonlFileSink::new(&path);

        sink.append(&record("CO", 5.0), "driver-1").await.unwrap();
        sink.append(&record("KS", 2.5), "driver-1").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: StoredMileageRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.user_id, "driver-1");
        assert_eq!(first.record, record("CO", 5.0));
        assert!(lines[1].contains("\"jurisdiction\":\"KS\""));
    }

    #[tokio::test]
    async fn test_unwritable_path() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened for append
        let sink = JsonlFileSink::new(dir.path());
        let result = sink.append(&record("CO", 1.0), "u").await;
        assert!(matches!(result, Err(SinkError::Io { .. })));
    }
}
