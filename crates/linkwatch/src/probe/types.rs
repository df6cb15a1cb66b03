use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::time::Duration;

/// Status carried by a completed echo exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoStatus {
    Success,
    TimedOut,
}

impl EchoStatus {
    pub fn is_success(self) -> bool {
        self == EchoStatus::Success
    }
}

impl fmt::Display for EchoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EchoStatus::Success => write!(f, "success"),
            EchoStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// A completed echo exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    pub status: EchoStatus,
    pub round_trip_time: Duration,
}

impl EchoReply {
    pub fn new(status: EchoStatus, round_trip_time: Duration) -> Self {
        Self { status, round_trip_time }
    }

    /// Successful reply after `round_trip_time`
    pub fn success(round_trip_time: Duration) -> Self {
        Self::new(EchoStatus::Success, round_trip_time)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of one probe
///
/// Normally exactly one of `reply` and `error_message` is set, but consumers
/// must cope with both or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Present only when the echo exchange completed
    pub reply: Option<EchoReply>,

    /// Present when the probe could not complete
    pub error_message: Option<String>,
}

impl ProbeOutcome {
    /// Outcome of a completed exchange
    pub fn replied(reply: EchoReply) -> Self {
        Self { reply: Some(reply), error_message: None }
    }

    /// Outcome of a probe that could not complete
    pub fn failed(message: impl Into<String>) -> Self {
        Self { reply: None, error_message: Some(message.into()) }
    }

    /// Round trip time of a successful reply
    pub fn success_rtt(&self) -> Option<Duration> {
        self.reply.filter(EchoReply::is_success).map(|reply| reply.round_trip_time)
    }
}

/// Options applied to the outgoing echo request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoOptions {
    pub dont_fragment: bool,

    /// Outgoing interface index for a link-local IPv6 destination
    pub scope_id: Option<u32>,
}

impl Default for EchoOptions {
    fn default() -> Self {
        Self { dont_fragment: true, scope_id: None }
    }
}

/// Where a probe is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeTarget {
    /// Host name, resolved again on every probe
    Host(String),
    /// Fixed address
    Addr(IpAddr),
    /// Link-local IPv6 address, only reachable through interface `scope_id`
    Scoped { address: Ipv6Addr, scope_id: u32 },
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeTarget::Host(name) => write!(f, "{name}"),
            ProbeTarget::Addr(addr) => write!(f, "{addr}"),
            ProbeTarget::Scoped { address, scope_id } => write!(f, "{address}%{scope_id}"),
        }
    }
}
