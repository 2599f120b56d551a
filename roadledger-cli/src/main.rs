//! RoadLedger CLI - Command-line interface
//!
//! Tracks per-jurisdiction mileage from a GPS feed and produces quarterly
//! IFTA reports from the recorded miles and fuel purchases.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::report::ReportArgs;
use commands::resolve::ResolveArgs;
use commands::track::TrackArgs;

#[derive(Parser)]
#[command(name = "roadledger")]
#[command(version = roadledger::VERSION)]
#[command(about = "IFTA mileage tracking and quarterly fuel-tax reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record mileage from a live GPS feed or a recorded trace
    Track(TrackArgs),

    /// Calculate the quarterly IFTA return
    Report(ReportArgs),

    /// Show which jurisdiction a coordinate falls in
    Resolve(ResolveArgs),

    /// Manage configuration settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Track(args) => commands::track::run(args),
        Commands::Report(args) => commands::report::run(args),
        Commands::Resolve(args) => commands::resolve::run(args),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_report_args() {
        let cli = Cli::try_parse_from([
            "roadledger", "report", "--year", "2024", "--quarter", "2", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.year, 2024);
                assert_eq!(args.quarter, 2);
                assert!(args.json);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_parse_negative_longitude() {
        let cli = Cli::try_parse_from([
            "roadledger", "resolve", "--lat", "39.1", "--lon", "-94.6",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Resolve(ref a) if a.lon == -94.6));
    }

    #[test]
    fn test_replay_conflicts_with_udp() {
        let result = Cli::try_parse_from([
            "roadledger", "track", "--udp-port", "5000", "--replay", "trace.jsonl",
        ]);
        assert!(result.is_err());
    }
}
