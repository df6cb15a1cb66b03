use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use super::incident::Incident;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to append incident to {}: {source}", .path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write incident to console: {0}")]
    Console(#[source] io::Error),
}

/// Destination for incident records
#[async_trait]
pub trait IncidentSink: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Persist one incident
    async fn record(&self, incident: &Incident) -> Result<(), SinkError>;
}

/// Append-only text log
///
/// The file is opened for every record, so it may be rotated or removed
/// between incidents.
#[derive(Debug, Clone)]
pub struct LogFileSink {
    path: PathBuf,
}

impl LogFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl IncidentSink for LogFileSink {
    fn name(&self) -> &str {
        "log-file"
    }

    async fn record(&self, incident: &Incident) -> Result<(), SinkError> {
        let append = |source| SinkError::Append { path: self.path.clone(), source };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(append)?;
        file.write_all(incident.to_string().as_bytes()).await.map_err(append)?;
        file.flush().await.map_err(append)
    }
}

/// Operator console (stdout)
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

#[async_trait]
impl IncidentSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn record(&self, incident: &Incident) -> Result<(), SinkError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(incident.to_string().as_bytes()).await.map_err(SinkError::Console)?;
        stdout.flush().await.map_err(SinkError::Console)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{EchoReply, ProbeOutcome};
    use crate::sampling::Sample;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use tempfile::tempdir;

    fn incident(second: u32) -> Incident {
        let start = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, second).unwrap();
        let sample = Sample::new(
            start,
            ProbeOutcome::failed("Network unreachable"),
            ProbeOutcome::replied(EchoReply::success(Duration::from_millis(8))),
        );
        Incident::from_sample(&sample, "www.google.com", Duration::from_millis(120)).unwrap()
    }

    #[tokio::test]
    async fn test_log_file_sink_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = LogFileSink::new(&path);

        sink.record(&incident(1)).await.unwrap();
        sink.record(&incident(2)).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, format!("{}{}", incident(1), incident(2)));
        assert!(contents.starts_with("2024-05-17T08:30:01"));
    }

    #[tokio::test]
    async fn test_log_file_sink_reports_unwritable_path() {
        let dir = tempdir().unwrap();
        let sink = LogFileSink::new(dir.path().join("missing").join("out.log"));

        let error = sink.record(&incident(1)).await.unwrap_err();
        assert!(matches!(error, SinkError::Append { .. }));
        assert!(error.to_string().contains("out.log"));
    }
}
