use std::fmt;
use std::time::Duration;

use crate::probe::ProbeOutcome;

/// Classification of a sample, decided by its external outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Healthy,
    /// The external probe could not complete
    ExternalTransportError,
    /// The external probe completed with a non-success status, or no reply
    ExternalPingFailure,
    /// The external reply succeeded but took longer than the threshold
    ExternalLatencyExceeded,
}

impl Classification {
    pub fn is_anomalous(self) -> bool {
        self != Classification::Healthy
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Healthy => write!(f, "healthy"),
            Classification::ExternalTransportError => write!(f, "external transport error"),
            Classification::ExternalPingFailure => write!(f, "external ping failure"),
            Classification::ExternalLatencyExceeded => write!(f, "external latency exceeded"),
        }
    }
}

/// Classify an external outcome. First matching rule wins.
pub fn classify(external: &ProbeOutcome, threshold: Duration) -> Classification {
    if external.error_message.is_some() {
        return Classification::ExternalTransportError;
    }

    match external.reply {
        Some(reply) if !reply.is_success() => Classification::ExternalPingFailure,
        None => Classification::ExternalPingFailure,
        Some(reply) if reply.round_trip_time > threshold => {
            Classification::ExternalLatencyExceeded
        }
        Some(_) => Classification::Healthy,
    }
}

/// State of the gateway path, attached to anomalous samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    Failed(String),
    Responded(Duration),
}

impl GatewayStatus {
    pub fn from_outcome(gateway: &ProbeOutcome) -> Self {
        if let Some(message) = &gateway.error_message {
            return GatewayStatus::Failed(message.clone());
        }

        match gateway.reply {
            Some(reply) if reply.is_success() => GatewayStatus::Responded(reply.round_trip_time),
            Some(reply) => GatewayStatus::Failed(reply.status.to_string()),
            None => GatewayStatus::Failed("unknown error".to_string()),
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayStatus::Failed(reason) => write!(f, "gateway probe failed: {reason}"),
            GatewayStatus::Responded(rtt) => write!(f, "gateway responded in {}ms", rtt.as_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{EchoReply, EchoStatus};

    const THRESHOLD: Duration = Duration::from_millis(120);

    fn ok(ms: u64) -> ProbeOutcome {
        ProbeOutcome::replied(EchoReply::success(Duration::from_millis(ms)))
    }

    #[test]
    fn test_healthy_within_threshold() {
        assert_eq!(classify(&ok(40), THRESHOLD), Classification::Healthy);
        assert_eq!(classify(&ok(120), THRESHOLD), Classification::Healthy);
    }

    #[test]
    fn test_latency_above_threshold() {
        assert_eq!(classify(&ok(121), THRESHOLD), Classification::ExternalLatencyExceeded);
        assert_eq!(classify(&ok(150), THRESHOLD), Classification::ExternalLatencyExceeded);
    }

    #[test]
    fn test_error_message_wins_over_reply() {
        let mut outcome = ok(10);
        outcome.error_message = Some("Network unreachable".to_string());
        assert_eq!(classify(&outcome, THRESHOLD), Classification::ExternalTransportError);
    }

    #[test]
    fn test_non_success_or_missing_reply_is_ping_failure() {
        let timed_out =
            ProbeOutcome::replied(EchoReply::new(EchoStatus::TimedOut, Duration::from_millis(5)));
        assert_eq!(classify(&timed_out, THRESHOLD), Classification::ExternalPingFailure);
        assert_eq!(classify(&ProbeOutcome::default(), THRESHOLD), Classification::ExternalPingFailure);
    }

    #[test]
    fn test_gateway_status_selection() {
        assert_eq!(GatewayStatus::from_outcome(&ok(10)).to_string(), "gateway responded in 10ms");

        let failed = ProbeOutcome::failed("No route to host");
        assert_eq!(
            GatewayStatus::from_outcome(&failed).to_string(),
            "gateway probe failed: No route to host"
        );

        let timed_out = ProbeOutcome::replied(EchoReply::new(
            EchoStatus::TimedOut,
            Duration::from_millis(1000),
        ));
        assert_eq!(
            GatewayStatus::from_outcome(&timed_out).to_string(),
            "gateway probe failed: timed out"
        );

        assert_eq!(
            GatewayStatus::from_outcome(&ProbeOutcome::default()).to_string(),
            "gateway probe failed: unknown error"
        );
    }
}
