//! `roadledger resolve` - look up the jurisdiction for a coordinate.

use clap::Args;
use roadledger::coord::Coordinate;
use roadledger::jurisdiction::{BoundingBoxResolver, JurisdictionResolver};

use crate::error::CliError;

/// Arguments for the resolve command.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

pub fn run(args: ResolveArgs) -> Result<(), CliError> {
    let coord =
        Coordinate::new(args.lat, args.lon).map_err(|e| CliError::InvalidInput(e.to_string()))?;
    let resolver = BoundingBoxResolver::us_contiguous();

    match resolver.resolve(&coord) {
        Some(code) => println!("{} -> {}", coord, code),
        None => println!("{} -> no jurisdiction (outside coverage)", coord),
    }
    Ok(())
}
