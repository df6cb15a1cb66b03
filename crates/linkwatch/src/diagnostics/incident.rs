use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::time::Duration;

use super::classify::{Classification, GatewayStatus, classify};
use crate::sampling::Sample;

/// A formatted record of one anomalous sample
///
/// Rendered as four lines: the tick timestamp, the external failure, the
/// gateway status at the same instant, and a blank separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    started_at: DateTime<Utc>,
    classification: Classification,
    external_line: String,
    gateway: GatewayStatus,
}

impl Incident {
    /// Build the incident for `sample`, or `None` when it is healthy
    pub fn from_sample(sample: &Sample, host: &str, threshold: Duration) -> Option<Self> {
        let external = sample.external();
        let classification = classify(external, threshold);

        let external_line = match classification {
            Classification::Healthy => return None,
            Classification::ExternalTransportError => format!(
                "Error pinging {host}: {}",
                external.error_message.as_deref().unwrap_or_default()
            ),
            Classification::ExternalPingFailure => match external.reply {
                Some(reply) => format!("Error pinging {host}: {}", reply.status),
                None => format!("Error pinging {host}: unknown error"),
            },
            Classification::ExternalLatencyExceeded => format!(
                "Excessive RTT pinging {host}: {}ms",
                external.reply.map(|r| r.round_trip_time.as_millis()).unwrap_or_default()
            ),
        };

        Some(Self {
            started_at: sample.started_at(),
            classification,
            external_line,
            gateway: GatewayStatus::from_outcome(sample.gateway()),
        })
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn external_line(&self) -> &str {
        &self.external_line
    }

    pub fn gateway(&self) -> &GatewayStatus {
        &self.gateway
    }
}

impl fmt::Display for Incident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.started_at.to_rfc3339_opts(SecondsFormat::Micros, true))?;
        writeln!(f, "{}", self.external_line)?;
        writeln!(f, "{}", self.gateway)?;
        writeln!(f)
    }
}
