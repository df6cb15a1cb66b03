use chrono::{DateTime, Utc};

use crate::probe::ProbeOutcome;

/// One joined pair of external and gateway outcomes from the same tick
///
/// Built only once both probes have resolved and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    started_at: DateTime<Utc>,
    external: ProbeOutcome,
    gateway: ProbeOutcome,
}

impl Sample {
    pub fn new(started_at: DateTime<Utc>, external: ProbeOutcome, gateway: ProbeOutcome) -> Self {
        Self { started_at, external, gateway }
    }

    /// UTC instant taken before either probe was issued
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn external(&self) -> &ProbeOutcome {
        &self.external
    }

    pub fn gateway(&self) -> &ProbeOutcome {
        &self.gateway
    }
}
