//! Replay adapter - streams a recorded JSON-lines trace.
//!
//! Each non-empty line is one [`PositionFix`]:
//!
//! ```text
//! {"latitude":39.74,"longitude":-104.99,"timestamp":"2025-02-10T14:00:00Z"}
//! {"latitude":39.10,"longitude":-94.58,"timestamp":"2025-02-10T23:00:00Z","accuracy_meters":8.0}
//! ```

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{PositionFix, PositionSource, PositionSubscription, SourceError};

/// Position source that replays fixes from memory or a trace file.
///
/// The stream ends after the last fix, which the tracking session treats as
/// the source going away.
#[derive(Debug, Clone)]
pub struct ReplayPositionSource {
    fixes: Vec<PositionFix>,
    pace: Duration,
}

impl ReplayPositionSource {
    /// Replay the given fixes back to back.
    pub fn new(fixes: Vec<PositionFix>) -> Self {
        Self {
            fixes,
            pace: Duration::ZERO,
        }
    }

    /// Load a JSON-lines trace.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::TraceRead {
            path: path.to_path_buf(),
            source,
        })?;
        let fixes = parse_trace(&content)?;
        info!(path = %path.display(), fixes = fixes.len(), "Loaded position trace");
        Ok(Self::new(fixes))
    }

    /// Wait this long between fixes.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Number of fixes in the trace.
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    /// Whether the trace is empty.
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Parse JSON-lines trace content.
pub(crate) fn parse_trace(content: &str) -> Result<Vec<PositionFix>, SourceError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<PositionFix>(line).map_err(|e| SourceError::TraceParse {
                line: index + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}

impl PositionSource for ReplayPositionSource {
    fn subscribe(&mut self) -> Result<PositionSubscription, SourceError> {
        let (tx, rx) = mpsc::channel(self.fixes.len().max(1));
        let cancel = CancellationToken::new();
        let fixes = self.fixes.clone();
        let pace = self.pace;
        let token = cancel.clone();

        tokio::spawn(async move {
            for fix in fixes {
                if token.is_cancelled() || tx.send(fix).await.is_err() {
                    debug!("Replay stopped early");
                    return;
                }
                if !pace.is_zero() {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = tokio::time::sleep(pace) => {}
                    }
                }
            }
            debug!("Replay finished");
        });

        Ok(PositionSubscription::new(rx, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    const TRACE: &str = r#"{"latitude":39.74,"longitude":-104.99,"timestamp":"2025-02-10T14:00:00Z"}

{"latitude":39.10,"longitude":-94.58,"timestamp":"2025-02-10T23:00:00Z","accuracy_meters":8.0}
"#;

    #[test]
    fn test_parse_trace_skips_blank_lines() {
        let fixes = parse_trace(TRACE).unwrap();
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].coordinate, Coordinate::new(39.74, -104.99).unwrap());
        assert_eq!(fixes[0].accuracy_meters, None);
        assert_eq!(fixes[1].accuracy_meters, Some(8.0));
        assert_eq!(
            fixes[1].timestamp,
            Utc.with_ymd_and_hms(2025, 2, 10, 23, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_trace_reports_line_number() {
        let content = "{\"latitude\":1.0,\"longitude\":2.0,\"timestamp\":\"2025-01-01T00:00:00Z\"}\nnot json\n";
        match parse_trace(content) {
            Err(SourceError::TraceParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRACE.as_bytes()).unwrap();
        let source = ReplayPositionSource::from_path(file.path()).unwrap();
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = ReplayPositionSource::from_path(Path::new("/nonexistent/trace.jsonl"));
        assert!(matches!(result, Err(SourceError::TraceRead { .. })));
    }

    #[tokio::test]
    async fn test_replay_streams_then_ends() {
        let mut source = ReplayPositionSource::new(parse_trace(TRACE).unwrap());
        let mut sub = source.subscribe().unwrap();
        assert!(sub.recv().await.is_some());
        assert!(sub.recv().await.is_some());
        assert!(sub.recv().await.is_none());
    }
}
