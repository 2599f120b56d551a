//! Jurisdiction code newtype.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Short code identifying a taxing jurisdiction (e.g. `CO`, `MO`, `ON`).
///
/// Codes are normalized to trimmed upper case so `"co"` and `"CO "` compare
/// equal. Ordering is lexical, which gives reports a deterministic row order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct JurisdictionCode(String);

impl JurisdictionCode {
    /// Create a code, normalizing case and surrounding whitespace.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// The normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JurisdictionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JurisdictionCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for JurisdictionCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<JurisdictionCode> for String {
    fn from(code: JurisdictionCode) -> Self {
        code.0
    }
}

impl AsRef<str> for JurisdictionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        assert_eq!(JurisdictionCode::new(" co "), JurisdictionCode::new("CO"));
        assert_eq!(JurisdictionCode::new("mo").as_str(), "MO");
    }

    #[test]
    fn test_ordering_is_lexical() {
        let mut codes = vec![
            JurisdictionCode::from("TX"),
            JurisdictionCode::from("CA"),
            JurisdictionCode::from("MO"),
        ];
        codes.sort();
        let ordered: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(ordered, vec!["CA", "MO", "TX"]);
    }

    #[test]
    fn test_serde_as_plain_string() {
        let code = JurisdictionCode::from("ky");
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"KY\"");

        let back: JurisdictionCode = serde_json::from_str("\"ky\"").unwrap();
        assert_eq!(back, code);
    }
}
