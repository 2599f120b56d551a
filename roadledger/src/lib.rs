//! RoadLedger - automatic IFTA mileage tracking and quarterly fuel tax reconciliation.
//!
//! Position fixes stream in from a [`position::PositionSource`]; the
//! [`tracking::TrackingSession`] attributes each mile to the jurisdiction it
//! was driven in and persists [`tracking::MileageRecord`]s through a
//! [`sink::MileageSink`]. At quarter end, [`ifta::calculate`] reconciles miles
//! against fuel purchases to produce the per-jurisdiction tax return.
//!
//! # Modules
//!
//! - [`coord`] - coordinates and great-circle distance
//! - [`jurisdiction`] - coordinate to jurisdiction lookup
//! - [`position`] - position source adapters
//! - [`tracking`] - mileage accumulation and session lifecycle
//! - [`sink`] - mileage record persistence
//! - [`ifta`] - rate tables, record stores and the tax calculator
//! - [`config`] - `~/.roadledger/config.ini`
//! - [`logging`] - tracing setup

pub mod config;
pub mod coord;
pub mod ifta;
pub mod jurisdiction;
pub mod logging;
pub mod position;
pub mod sink;
pub mod tracking;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
