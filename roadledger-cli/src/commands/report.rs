//! `roadledger report` - quarterly IFTA reconciliation.

use std::path::PathBuf;

use clap::Args;
use console::style;
use roadledger::config::ConfigFile;
use roadledger::ifta::{
    calculate, FuelRecordSource, IftaCalculationResult, JsonlRecordStore, MileageRecordSource,
    Quarter, RateTable,
};

use crate::error::CliError;

/// Arguments for the report command.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Reporting year
    #[arg(long)]
    pub year: i32,

    /// Reporting quarter (1-4)
    #[arg(long)]
    pub quarter: u8,

    /// Mileage file (overrides sink.path)
    #[arg(long)]
    pub mileage: Option<PathBuf>,

    /// Fuel purchases file (overrides ifta.fuel_file)
    #[arg(long)]
    pub fuel: Option<PathBuf>,

    /// Tax rate table (overrides ifta.rates_file)
    #[arg(long)]
    pub rates: Option<PathBuf>,

    /// User whose records are reported (overrides tracking.user_id)
    #[arg(long)]
    pub user: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ReportArgs) -> Result<(), CliError> {
    let config = ConfigFile::load()?;

    let quarter = Quarter::new(args.quarter).map_err(|e| CliError::InvalidInput(e.to_string()))?;
    let (from, to) = quarter.date_range(args.year).ok_or_else(|| {
        CliError::InvalidInput(format!("Year {} is out of range", args.year))
    })?;

    let rates_path = args.rates.or(config.ifta.rates_file).ok_or_else(|| {
        CliError::Config(
            "No rate table configured. Pass --rates or set ifta.rates_file".to_string(),
        )
    })?;
    let rates = RateTable::load(&rates_path)?;

    let user_id = args.user.unwrap_or(config.tracking.user_id);
    let mut store = JsonlRecordStore::new()
        .with_mileage_file(args.mileage.unwrap_or(config.sink.path));
    if let Some(fuel) = args.fuel.or(config.ifta.fuel_file) {
        store = store.with_fuel_file(fuel);
    }

    let mileage = store.mileage(&user_id, from, to)?;
    let fuel = store.fuel_purchases(&user_id, from, to)?;
    let result = calculate(&mileage, &fuel, &rates, quarter, args.year);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::InvalidInput(format!("Failed to serialize report: {}", e)))?;
        println!("{}", json);
    } else {
        print_report(&user_id, &result);
    }
    Ok(())
}

fn print_report(user_id: &str, result: &IftaCalculationResult) {
    println!(
        "{}",
        style(format!(
            "IFTA Report {} {} ({})",
            result.quarter, result.year, user_id
        ))
        .bold()
    );
    println!("Rate table: {}", result.rate_table_version);
    println!();

    if result.state_breakdown.is_empty() {
        println!("No mileage or fuel recorded for this quarter.");
        return;
    }

    println!(
        "{:<5} {:>10} {:>10} {:>10} {:>8} {:>10} {:>10} {:>10}",
        "Jur", "Miles", "Used gal", "Bought gal", "Rate", "Owed", "Paid", "Net"
    );
    println!("{}", "─".repeat(80));
    for row in &result.state_breakdown {
        let net = format!("{:>10}", row.net_tax.to_string());
        let net = if row.net_tax.is_sign_negative() && !row.net_tax.is_zero() {
            style(net).green()
        } else {
            style(net)
        };
        println!(
            "{:<5} {:>10.1} {:>10.2} {:>10.2} {:>8} {:>10} {:>10} {}",
            row.jurisdiction.as_str(),
            row.miles,
            row.fuel_used_gallons,
            row.fuel_purchased_gallons,
            row.rate_per_gallon.to_string(),
            row.tax_owed.to_string(),
            row.tax_paid.to_string(),
            net
        );
    }
    println!("{}", "─".repeat(80));
    println!("Total miles:     {:.1}", result.total_miles);
    println!("Fuel purchased:  {:.2} gal", result.total_fuel_purchased);
    println!("Average MPG:     {:.2}", result.average_mpg);
    if result.has_surcharge_jurisdiction {
        println!(
            "Surcharge:       {} (reported separately)",
            result.surcharge_total
        );
    }

    let label = if result.is_refund() {
        style("Net refund:").green().bold()
    } else {
        style("Net due:").bold()
    };
    println!("{}       {}", label, result.net_amount.abs());

    if !result.unrated_jurisdictions.is_empty() {
        let codes: Vec<&str> = result
            .unrated_jurisdictions
            .iter()
            .map(|c| c.as_str())
            .collect();
        println!();
        println!(
            "{} no rate for {} (taxed at 0)",
            style("Warning:").yellow().bold(),
            codes.join(", ")
        );
    }
    if !result.unrepresentable_jurisdictions.is_empty() {
        let codes: Vec<&str> = result
            .unrepresentable_jurisdictions
            .iter()
            .map(|c| c.as_str())
            .collect();
        println!(
            "{} amounts out of range for {} (reported as 0)",
            style("Warning:").yellow().bold(),
            codes.join(", ")
        );
    }
}
