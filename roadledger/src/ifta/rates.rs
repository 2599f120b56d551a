//! Versioned jurisdiction fuel tax rates.
//!
//! Rate tables are published quarterly, so they are loaded from a JSON
//! document rather than compiled in:
//!
//! ```json
//! {
//!   "version": "2025-Q1",
//!   "rates": [
//!     { "jurisdiction": "CA", "rate_per_gallon": "0.80", "display_name": "California" },
//!     { "jurisdiction": "KY", "rate_per_gallon": "0.287", "display_name": "Kentucky",
//!       "surcharge_rate_per_mile": "0.0285" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::jurisdiction::JurisdictionCode;

/// Errors loading a rate table.
#[derive(Debug, Error)]
pub enum RateTableError {
    #[error("Failed to read rate table '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rate table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate rate for jurisdiction {0}")]
    Duplicate(JurisdictionCode),

    #[error("Negative rate for jurisdiction {0}")]
    NegativeRate(JurisdictionCode),
}

/// Tax rate for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionTaxRate {
    pub jurisdiction: JurisdictionCode,
    pub rate_per_gallon: Decimal,
    #[serde(default)]
    pub display_name: String,
    /// Per-mile surcharge some jurisdictions levy on top of fuel tax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surcharge_rate_per_mile: Option<Decimal>,
}

impl JurisdictionTaxRate {
    pub fn new(jurisdiction: impl Into<JurisdictionCode>, rate_per_gallon: Decimal) -> Self {
        let jurisdiction = jurisdiction.into();
        Self {
            display_name: jurisdiction.to_string(),
            jurisdiction,
            rate_per_gallon,
            surcharge_rate_per_mile: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_surcharge(mut self, per_mile: Decimal) -> Self {
        self.surcharge_rate_per_mile = Some(per_mile);
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RateTableDocument {
    version: String,
    rates: Vec<JurisdictionTaxRate>,
}

/// Lookup of tax rates by jurisdiction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    version: String,
    rates: BTreeMap<JurisdictionCode, JurisdictionTaxRate>,
}

impl RateTable {
    /// Build a table, rejecting duplicate or negative rates.
    pub fn new(
        version: impl Into<String>,
        rates: impl IntoIterator<Item = JurisdictionTaxRate>,
    ) -> Result<Self, RateTableError> {
        let mut map = BTreeMap::new();
        for rate in rates {
            if rate.rate_per_gallon.is_sign_negative() && !rate.rate_per_gallon.is_zero() {
                return Err(RateTableError::NegativeRate(rate.jurisdiction));
            }
            let code = rate.jurisdiction.clone();
            if map.insert(code.clone(), rate).is_some() {
                return Err(RateTableError::Duplicate(code));
            }
        }
        Ok(Self {
            version: version.into(),
            rates: map,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, RateTableError> {
        let document: RateTableDocument = serde_json::from_str(json)?;
        Self::new(document.version, document.rates)
    }

    pub fn load(path: &Path) -> Result<Self, RateTableError> {
        let content = std::fs::read_to_string(path).map_err(|source| RateTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&content)?;
        debug!(path = %path.display(), version = %table.version, rates = table.len(), "Loaded rate table");
        Ok(table)
    }

    pub fn to_json_string(&self) -> Result<String, RateTableError> {
        let document = RateTableDocument {
            version: self.version.clone(),
            rates: self.rates.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, code: &JurisdictionCode) -> Option<&JurisdictionTaxRate> {
        self.rates.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JurisdictionTaxRate> {
        self.rates.values()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;

    const TABLE: &str = r#"{
        "version": "2025-Q1",
        "rates": [
            { "jurisdiction": "ca", "rate_per_gallon": "0.80", "display_name": "California" },
            { "jurisdiction": "KY", "rate_per_gallon": 0.287, "display_name": "Kentucky",
              "surcharge_rate_per_mile": "0.0285" }
        ]
    }"#;

    #[test]
    fn test_parse() {
        let table = RateTable::from_json_str(TABLE).unwrap();
        assert_eq!(table.version(), "2025-Q1");
        assert_eq!(table.len(), 2);

        let ca = table.get(&"CA".into()).expect("code is normalized");
        assert_eq!(ca.rate_per_gallon, Decimal::from_str("0.80").unwrap());
        assert!(ca.surcharge_rate_per_mile.is_none());

        let ky = table.get(&"KY".into()).unwrap();
        assert_eq!(ky.surcharge_rate_per_mile, Some(Decimal::from_str("0.0285").unwrap()));
    }

    #[test]
    fn test_duplicate_rejected() {
        let json = r#"{"version":"v","rates":[
            {"jurisdiction":"CA","rate_per_gallon":"0.8"},
            {"jurisdiction":"ca","rate_per_gallon":"0.9"}]}"#;
        assert!(matches!(
            RateTable::from_json_str(json),
            Err(RateTableError::Duplicate(_))
        ));
    }

    #[test]
    fn test_negative_rejected() {
        let json = r#"{"version":"v","rates":[{"jurisdiction":"CA","rate_per_gallon":"-0.1"}]}"#;
        assert!(matches!(
            RateTable::from_json_str(json),
            Err(RateTableError::NegativeRate(_))
        ));
    }

    #[test]
    fn test_load_and_export() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();

        let table = RateTable::load(file.path()).unwrap();
        let reparsed = RateTable::from_json_str(&table.to_json_string().unwrap()).unwrap();
        assert_eq!(table, reparsed);
    }

    #[test]
    fn test_missing_file() {
        let result = RateTable::load(Path::new("/nonexistent/rates.json"));
        assert!(matches!(result, Err(RateTableError::Io { .. })));
    }
}
