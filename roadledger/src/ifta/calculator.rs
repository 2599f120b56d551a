//! Quarterly fuel tax reconciliation.
//!
//! Fuel consumption is apportioned by distance: the fleet average MPG over
//! the quarter converts each jurisdiction's miles into taxable gallons. Tax
//! already paid at the pump is credited against that, per jurisdiction.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use super::quarter::Quarter;
use super::rates::RateTable;
use super::records::{FuelPurchaseRecord, MileageEntry};
use super::result::{IftaCalculationResult, StateBreakdownRow};
use crate::jurisdiction::JurisdictionCode;

/// Round a money value to cents, half away from zero.
fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `quantity * rate` rounded to cents. `None` when the product does not fit
/// in a `Decimal` (non-finite input or beyond ~7.9e28).
fn money(quantity: f64, rate: Decimal) -> Option<Decimal> {
    Decimal::from_f64(quantity)?.checked_mul(rate).map(cents)
}

/// Compute the reconciliation for `quarter` of `year`.
///
/// Records outside the quarter are ignored. Never fails: with no fuel the
/// average MPG is zero and every row owes nothing.
pub fn calculate(
    mileage: &[MileageEntry],
    fuel: &[FuelPurchaseRecord],
    rates: &RateTable,
    quarter: Quarter,
    year: i32,
) -> IftaCalculationResult {
    let mut miles_by: BTreeMap<JurisdictionCode, f64> = BTreeMap::new();
    for entry in mileage.iter().filter(|e| quarter.contains(e.date, year)) {
        *miles_by.entry(entry.jurisdiction.clone()).or_default() += entry.miles;
    }

    let mut fuel_by: BTreeMap<JurisdictionCode, f64> = BTreeMap::new();
    for purchase in fuel.iter().filter(|p| quarter.contains(p.purchase_date, year)) {
        *fuel_by.entry(purchase.jurisdiction.clone()).or_default() += purchase.gallons;
    }

    let total_miles: f64 = miles_by.values().sum();
    let total_fuel_purchased: f64 = fuel_by.values().sum();
    let average_mpg = if total_fuel_purchased > 0.0 {
        total_miles / total_fuel_purchased
    } else {
        0.0
    };

    let codes: BTreeSet<&JurisdictionCode> = miles_by.keys().chain(fuel_by.keys()).collect();
    let mut state_breakdown = Vec::with_capacity(codes.len());
    let mut unrated_jurisdictions = Vec::new();
    let mut unrepresentable_jurisdictions = Vec::new();
    let mut net_amount = Decimal::ZERO;
    let mut surcharge_total = Decimal::ZERO;
    let mut has_surcharge_jurisdiction = false;

    for code in codes {
        let miles = miles_by.get(code).copied().unwrap_or(0.0);
        let purchased = fuel_by.get(code).copied().unwrap_or(0.0);
        let fuel_used = if average_mpg > 0.0 {
            miles / average_mpg
        } else {
            0.0
        };

        let rate = rates.get(code);
        if rate.is_none() {
            warn!(jurisdiction = %code, version = %rates.version(), "No tax rate for jurisdiction, using zero");
            unrated_jurisdictions.push(code.clone());
        }
        let rate_per_gallon = rate.map(|r| r.rate_per_gallon).unwrap_or(Decimal::ZERO);

        let tax_owed = money(fuel_used, rate_per_gallon);
        let tax_paid = money(purchased, rate_per_gallon);
        let surcharge_rate = rate.and_then(|r| r.surcharge_rate_per_mile);
        let surcharge = surcharge_rate.map(|per_mile| money(miles, per_mile));

        let representable = tax_owed.is_some()
            && tax_paid.is_some()
            && surcharge.map_or(true, |s| s.is_some());
        if !representable {
            warn!(
                jurisdiction = %code,
                miles,
                fuel_used,
                purchased,
                "Amount out of range, using zero"
            );
            unrepresentable_jurisdictions.push(code.clone());
        }
        let tax_owed = tax_owed.unwrap_or(Decimal::ZERO);
        let tax_paid = tax_paid.unwrap_or(Decimal::ZERO);
        let net_tax = tax_owed - tax_paid;
        let surcharge = surcharge.map(|s| s.unwrap_or(Decimal::ZERO));
        if let Some(amount) = surcharge {
            has_surcharge_jurisdiction = true;
            surcharge_total += amount;
        }

        net_amount += net_tax;
        state_breakdown.push(StateBreakdownRow {
            jurisdiction: code.clone(),
            miles,
            fuel_used_gallons: fuel_used,
            fuel_purchased_gallons: purchased,
            rate_per_gallon,
            tax_owed,
            tax_paid,
            net_tax,
            surcharge,
        });
    }

    debug!(
        quarter = %quarter,
        year,
        total_miles,
        total_fuel_purchased,
        net_amount = %net_amount,
        rows = state_breakdown.len(),
        "IFTA calculation complete"
    );

    IftaCalculationResult {
        quarter,
        year,
        rate_table_version: rates.version().to_string(),
        total_miles,
        total_fuel_purchased,
        average_mpg,
        net_amount,
        has_surcharge_jurisdiction,
        surcharge_total,
        state_breakdown,
        unrated_jurisdictions,
        unrepresentable_jurisdictions,
    }
}
