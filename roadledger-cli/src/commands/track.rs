//! `roadledger track` - run a tracking session until Ctrl+C or the source ends.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use roadledger::config::ConfigFile;
use roadledger::jurisdiction::BoundingBoxResolver;
use roadledger::logging::init_logging;
use roadledger::position::{
    PositionSource, ReplayPositionSource, UdpPositionSource, DEFAULT_UDP_PORT,
};
use roadledger::sink::{JsonlFileSink, StoredMileageRecord};
use roadledger::tracking::{SessionSummary, StaticPermission, TrackingSession};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;

/// How often a progress line is printed.
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Arguments for the track command.
#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Listen for NMEA/XGPS sentences on this UDP port
    #[arg(long, conflicts_with = "replay")]
    pub udp_port: Option<u16>,

    /// Replay a recorded JSON-lines trace instead of listening for GPS
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Delay between replayed fixes in milliseconds
    #[arg(long, default_value = "0")]
    pub pace_ms: u64,

    /// User id stored with each record (overrides tracking.user_id)
    #[arg(long)]
    pub user: Option<String>,

    /// Mileage file (overrides sink.path)
    #[arg(long)]
    pub sink: Option<PathBuf>,
}

pub fn run(args: TrackArgs) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let _logging = init_logging(&config.logging.directory, &config.logging.file)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    info!(version = roadledger::VERSION, "RoadLedger tracking starting");

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    runtime.block_on(run_async(args, config))
}

async fn run_async(args: TrackArgs, config: ConfigFile) -> Result<(), CliError> {
    let user_id = args.user.unwrap_or_else(|| config.tracking.user_id.clone());
    let sink_path = args.sink.unwrap_or_else(|| config.sink.path.clone());

    let mut source: Box<dyn PositionSource> = match &args.replay {
        Some(path) => {
            let replay = ReplayPositionSource::from_path(path)?
                .with_pace(Duration::from_millis(args.pace_ms));
            println!("Replaying {} fixes from {}", replay.len(), path.display());
            Box::new(replay)
        }
        None => {
            let port = args.udp_port.unwrap_or(DEFAULT_UDP_PORT);
            let udp = UdpPositionSource::bind(port).await?;
            println!("Listening for GPS on UDP port {}", udp.port());
            Box::new(udp)
        }
    };

    let mut session = TrackingSession::with_config(
        Arc::new(BoundingBoxResolver::us_contiguous()),
        Arc::new(StaticPermission::granted()),
        Arc::new(JsonlFileSink::new(&sink_path)),
        user_id.clone(),
        config.tracking_config(),
    );

    println!("Waiting for first GPS fix...");
    session.start(source.as_mut()).await?;
    println!("Tracking as '{}', writing to {}", user_id, sink_path.display());
    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        shutdown_clone.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let mut ticker = tokio::time::interval(STATUS_INTERVAL);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = session.wait_for_source_end() => {
                println!("Position source ended.");
                break;
            }
            _ = ticker.tick() => {
                let status = session.status();
                println!(
                    "[{}] {:.1} mi total | {:.2} mi pending | {} records | {} writes queued",
                    status
                        .current_jurisdiction
                        .as_ref()
                        .map(|c| c.as_str())
                        .unwrap_or("--"),
                    status.total_miles,
                    status.accumulated_miles,
                    status.records_emitted,
                    status.pending_writes,
                );
            }
        }
    }

    let summary = session.stop().await?;
    print_summary(&summary);

    if !summary.pending.is_empty() {
        let pending_path = pending_path_for(&sink_path);
        write_pending(&pending_path, &user_id, &summary)?;
        warn!(
            count = summary.pending.len(),
            path = %pending_path.display(),
            "Unsaved mileage records written to pending file"
        );
        println!();
        println!(
            "{} {} record(s) could not be saved; kept in {}",
            style("Warning:").yellow().bold(),
            summary.pending.len(),
            pending_path.display()
        );
    }
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    let visited: Vec<&str> = summary
        .jurisdictions_visited
        .iter()
        .map(|c| c.as_str())
        .collect();

    println!();
    println!("{}", style("Session Summary").bold());
    println!("───────────────");
    println!("  Duration:      {}s", summary.duration_seconds);
    println!("  Total miles:   {:.2}", summary.total_miles);
    if summary.unattributed_miles > 0.0 {
        println!("  Unattributed:  {:.2}", summary.unattributed_miles);
    }
    println!("  Jurisdictions: {}", visited.join(", "));
    println!(
        "  Records:       {} emitted, {} saved",
        summary.records_emitted, summary.records_saved
    );
    if summary.dropped_fixes > 0 {
        println!("  Dropped fixes: {}", summary.dropped_fixes);
    }
}

/// Sidecar file for records the sink never accepted.
fn pending_path_for(sink_path: &Path) -> PathBuf {
    let mut name = sink_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".pending");
    sink_path.with_file_name(name)
}

fn write_pending(path: &Path, user_id: &str, summary: &SessionSummary) -> Result<(), CliError> {
    let write_err = |error| CliError::FileWrite {
        path: path.to_path_buf(),
        error,
    };

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    for record in &summary.pending {
        let line = serde_json::to_string(&StoredMileageRecord {
            user_id: user_id.to_string(),
            record: record.clone(),
        })
        .map_err(|e| CliError::FileWrite {
            path: path.to_path_buf(),
            error: e.into(),
        })?;
        writeln!(file, "{}", line).map_err(write_err)?;
    }
    Ok(())
}
