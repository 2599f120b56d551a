//! Read-only record sources for reporting.
//!
//! The calculator only needs "this user's records in this date range". The
//! JSON-lines store reads back what [`JsonlFileSink`](crate::sink::JsonlFileSink)
//! writes plus a JSON array of fuel purchases:
//!
//! ```json
//! [
//!   { "user_id": "driver-1", "jurisdiction": "CA", "gallons": 100.0,
//!     "amount": "459.90", "purchase_date": "2025-01-10" }
//! ]
//! ```
//!
//! Fuel entries without a `user_id` belong to every user.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::records::{FuelPurchaseRecord, MileageEntry};
use crate::sink::StoredMileageRecord;
use crate::tracking::MileageRecord;

/// Errors reading stored records.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record in '{}' line {line}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Mileage for a user within an inclusive date range.
pub trait MileageRecordSource: Send + Sync {
    fn mileage(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MileageEntry>, RecordStoreError>;
}

/// Fuel purchases for a user within an inclusive date range.
pub trait FuelRecordSource: Send + Sync {
    fn fuel_purchases(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FuelPurchaseRecord>, RecordStoreError>;
}

/// A fuel purchase as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFuelPurchase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub purchase: FuelPurchaseRecord,
}

fn in_range(date: NaiveDate, from: NaiveDate, to: NaiveDate) -> bool {
    date >= from && date <= to
}

/// File-backed store. A configured file that does not exist yet reads as empty.
#[derive(Debug, Clone, Default)]
pub struct JsonlRecordStore {
    mileage_path: Option<PathBuf>,
    fuel_path: Option<PathBuf>,
}

impl JsonlRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mileage_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.mileage_path = Some(path.into());
        self
    }

    pub fn with_fuel_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.fuel_path = Some(path.into());
        self
    }

    fn read_optional(path: &Path) -> Result<Option<String>, RecordStoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Record file not found, treating as empty");
                Ok(None)
            }
            Err(source) => Err(RecordStoreError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl MileageRecordSource for JsonlRecordStore {
    fn mileage(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MileageEntry>, RecordStoreError> {
        let Some(path) = self.mileage_path.as_deref() else {
            return Ok(Vec::new());
        };
        let Some(content) = Self::read_optional(path)? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let stored: StoredMileageRecord =
                serde_json::from_str(line).map_err(|e| RecordStoreError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: e.to_string(),
                })?;
            if stored.user_id == user_id && in_range(stored.record.date(), from, to) {
                entries.push(MileageEntry::from(&stored.record));
            }
        }
        Ok(entries)
    }
}

impl FuelRecordSource for JsonlRecordStore {
    fn fuel_purchases(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FuelPurchaseRecord>, RecordStoreError> {
        let Some(path) = self.fuel_path.as_deref() else {
            return Ok(Vec::new());
        };
        let Some(content) = Self::read_optional(path)? else {
            return Ok(Vec::new());
        };

        let stored: Vec<StoredFuelPurchase> =
            serde_json::from_str(&content).map_err(|e| RecordStoreError::Parse {
                path: path.to_path_buf(),
                line: e.line(),
                reason: e.to_string(),
            })?;

        Ok(stored
            .into_iter()
            .filter(|s| s.user_id.as_deref().map_or(true, |u| u == user_id))
            .map(|s| s.purchase)
            .filter(|p| in_range(p.purchase_date, from, to))
            .collect())
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    mileage: RwLock<Vec<(String, MileageEntry)>>,
    fuel: RwLock<Vec<(String, FuelPurchaseRecord)>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mileage(&self, user_id: &str, entry: MileageEntry) {
        self.mileage.write().push((user_id.to_string(), entry));
    }

    pub fn add_record(&self, user_id: &str, record: &MileageRecord) {
        self.add_mileage(user_id, MileageEntry::from(record));
    }

    pub fn add_fuel(&self, user_id: &str, purchase: FuelPurchaseRecord) {
        self.fuel.write().push((user_id.to_string(), purchase));
    }
}

impl MileageRecordSource for InMemoryRecordStore {
    fn mileage(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MileageEntry>, RecordStoreError> {
        Ok(self
            .mileage
            .read()
            .iter()
            .filter(|(user, e)| user == user_id && in_range(e.date, from, to))
            .map(|(_, e)| e.clone())
            .collect())
    }
}

impl FuelRecordSource for InMemoryRecordStore {
    fn fuel_purchases(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FuelPurchaseRecord>, RecordStoreError> {
        Ok(self
            .fuel
            .read()
            .iter()
            .filter(|(user, p)| user == user_id && in_range(p.purchase_date, from, to))
            .map(|(_, p)| p.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn stored_line(user: &str, code: &str, miles: f64, month: u32) -> String {
        let stored = StoredMileageRecord {
            user_id: user.to_string(),
            record: MileageRecord {
                jurisdiction: code.into(),
                miles,
                occurred_at: Utc.with_ymd_and_hms(2025, month, 5, 12, 0, 0).unwrap(),
                endpoint: Coordinate::new(39.0, -104.0).unwrap(),
            },
        };
        serde_json::to_string(&stored).unwrap()
    }

    #[test]
    fn test_jsonl_mileage_filters_user_and_range() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mileage.jsonl");
        let content = [
            stored_line("a", "CO", 5.0, 1),
            String::new(),
            stored_line("b", "KS", 7.0, 1),
            stored_line("a", "MO", 3.0, 5),
        ]
        .join("\n");
        std::fs::write(&path, content).unwrap();

        let store = JsonlRecordStore::new().with_mileage_file(&path);
        let entries = store.mileage("a", date(1, 1), date(3, 31)).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].jurisdiction.as_str(), "CO");
        assert_eq!(entries[0].date, date(1, 5));
    }

    #[test]
    fn test_jsonl_bad_line_reports_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mileage.jsonl");
        std::fs::write(&path, format!("{}\n{{oops\n", stored_line("a", "CO", 5.0, 1))).unwrap();

        let store = JsonlRecordStore::new().with_mileage_file(&path);
        match store.mileage("a", date(1, 1), date(12, 31)) {
            Err(RecordStoreError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_files_read_empty() {
        let store = JsonlRecordStore::new()
            .with_mileage_file("/nonexistent/mileage.jsonl")
            .with_fuel_file("/nonexistent/fuel.json");
        assert!(store.mileage("a", date(1, 1), date(12, 31)).unwrap().is_empty());
        assert!(store.fuel_purchases("a", date(1, 1), date(12, 31)).unwrap().is_empty());
    }

    #[test]
    fn test_fuel_file_shared_and_owned_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fuel.json");
        std::fs::write(
            &path,
            r#"[
                {"user_id":"a","jurisdiction":"CA","gallons":100.0,"amount":"459.90","purchase_date":"2025-01-10"},
                {"user_id":"b","jurisdiction":"NV","gallons":50.0,"amount":"200.00","purchase_date":"2025-01-11"},
                {"jurisdiction":"OR","gallons":20.0,"amount":"90.00","purchase_date":"2025-02-01"},
                {"user_id":"a","jurisdiction":"CA","gallons":80.0,"amount":"350.00","purchase_date":"2025-07-01"}
            ]"#,
        )
        .unwrap();

        let store = JsonlRecordStore::new().with_fuel_file(&path);
        let fuel = store.fuel_purchases("a", date(1, 1), date(3, 31)).unwrap();

        let codes: Vec<&str> = fuel.iter().map(|p| p.jurisdiction.as_str()).collect();
        assert_eq!(codes, vec!["CA", "OR"]);
        assert_eq!(fuel[0].amount, Decimal::new(45990, 2));
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryRecordStore::new();
        store.add_mileage("a", MileageEntry::new("CA", 10.0, date(2, 1)));
        store.add_mileage("b", MileageEntry::new("CA", 10.0, date(2, 1)));
        store.add_fuel(
            "a",
            FuelPurchaseRecord {
                jurisdiction: "CA".into(),
                gallons: 5.0,
                amount: Decimal::new(2000, 2),
                purchase_date: date(2, 2),
            },
        );

        assert_eq!(store.mileage("a", date(1, 1), date(3, 31)).unwrap().len(), 1);
        assert_eq!(store.fuel_purchases("a", date(1, 1), date(3, 31)).unwrap().len(), 1);
        assert!(store.fuel_purchases("b", date(1, 1), date(3, 31)).unwrap().is_empty());
    }
}
