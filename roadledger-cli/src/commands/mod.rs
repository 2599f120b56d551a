//! Subcommand implementations.

pub mod config;
pub mod report;
pub mod resolve;
pub mod track;
