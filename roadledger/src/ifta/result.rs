//! Calculation output.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quarter::Quarter;
use crate::jurisdiction::JurisdictionCode;

/// One jurisdiction's line on the quarterly return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBreakdownRow {
    pub jurisdiction: JurisdictionCode,
    pub miles: f64,
    /// Fuel attributed to this jurisdiction at the fleet average MPG.
    pub fuel_used_gallons: f64,
    pub fuel_purchased_gallons: f64,
    /// Rate applied, zero when the table has none.
    pub rate_per_gallon: Decimal,
    /// Tax due on fuel used.
    pub tax_owed: Decimal,
    /// Tax already paid at the pump.
    pub tax_paid: Decimal,
    /// `tax_owed - tax_paid`; negative means a credit.
    pub net_tax: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surcharge: Option<Decimal>,
}

/// Quarterly fuel tax reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IftaCalculationResult {
    pub quarter: Quarter,
    pub year: i32,
    pub rate_table_version: String,
    pub total_miles: f64,
    pub total_fuel_purchased: f64,
    /// Zero when no fuel was purchased.
    pub average_mpg: f64,
    /// Sum of every row's `net_tax`. Positive is owed, negative is a refund.
    pub net_amount: Decimal,
    pub has_surcharge_jurisdiction: bool,
    /// Reported separately; never part of `net_amount`.
    pub surcharge_total: Decimal,
    /// Sorted by jurisdiction code.
    pub state_breakdown: Vec<StateBreakdownRow>,
    /// Jurisdictions that appeared in the data but had no rate.
    pub unrated_jurisdictions: Vec<JurisdictionCode>,
    /// Jurisdictions whose miles or gallons were too large to price; their
    /// amounts are reported as zero.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrepresentable_jurisdictions: Vec<JurisdictionCode>,
}

impl IftaCalculationResult {
    /// Whether the filer is owed money back.
    pub fn is_refund(&self) -> bool {
        self.net_amount.is_sign_negative() && !self.net_amount.is_zero()
    }

    pub fn row(&self, code: &JurisdictionCode) -> Option<&StateBreakdownRow> {
        self.state_breakdown.iter().find(|r| &r.jurisdiction == code)
    }
}
