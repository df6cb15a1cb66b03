/// Probe module - one ICMP echo per call
///
/// This module is responsible for:
/// - Describing probe outcomes as plain values
/// - Abstracting the ICMP echo primitive behind `EchoTransport`
/// - Running a single bounded probe that never fails past its boundary
pub mod executor;
pub mod icmp;
pub mod transport;
pub mod types;

pub use executor::ProbeExecutor;
pub use icmp::IcmpTransport;
pub use transport::{EchoTransport, TransportError};
pub use types::{EchoOptions, EchoReply, EchoStatus, ProbeOutcome, ProbeTarget};
