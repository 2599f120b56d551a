//! IFTA quarterly fuel tax reconciliation
//!
//! The International Fuel Tax Agreement lets a carrier file one quarterly
//! return covering every member jurisdiction. Fuel used in each jurisdiction
//! is estimated from its share of miles at the fleet average MPG, taxed at
//! that jurisdiction's rate, and credited with tax already paid at the pump.
//!
//! ```ignore
//! let rates = RateTable::load(Path::new("rates.json"))?;
//! let quarter = Quarter::new(1)?;
//! let (from, to) = quarter.date_range(2025).unwrap();
//!
//! let mileage = store.mileage("driver-1", from, to)?;
//! let fuel = store.fuel_purchases("driver-1", from, to)?;
//! let result = calculate(&mileage, &fuel, &rates, quarter, 2025);
//! println!("Net: {}", result.net_amount);
//! ```

mod calculator;
mod quarter;
mod rates;
mod records;
mod result;
mod store;

pub use calculator::calculate;
pub use quarter::{InvalidQuarter, Quarter};
pub use rates::{JurisdictionTaxRate, RateTable, RateTableError};
pub use records::{FuelPurchaseRecord, MileageEntry};
pub use result::{IftaCalculationResult, StateBreakdownRow};
pub use store::{
    FuelRecordSource, InMemoryRecordStore, JsonlRecordStore, MileageRecordSource,
    RecordStoreError, StoredFuelPurchase,
};
