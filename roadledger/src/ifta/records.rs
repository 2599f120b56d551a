//! Calculator inputs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::jurisdiction::JurisdictionCode;
use crate::tracking::MileageRecord;

/// Fuel bought in one jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelPurchaseRecord {
    pub jurisdiction: JurisdictionCode,
    pub gallons: f64,
    /// Price paid, tax included.
    pub amount: Decimal,
    pub purchase_date: NaiveDate,
}

/// Miles driven in one jurisdiction on one day.
///
/// Built from tracked [`MileageRecord`]s or entered by hand from a trip log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MileageEntry {
    pub jurisdiction: JurisdictionCode,
    pub miles: f64,
    pub date: NaiveDate,
}

impl MileageEntry {
    pub fn new(jurisdiction: impl Into<JurisdictionCode>, miles: f64, date: NaiveDate) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            miles,
            date,
        }
    }
}

impl From<&MileageRecord> for MileageEntry {
    fn from(record: &MileageRecord) -> Self {
        Self {
            jurisdiction: record.jurisdiction.clone(),
            miles: record.miles,
            date: record.date(),
        }
    }
}
