//! Linkwatch - dual-path network latency monitoring
//!
//! Probes an external host and the local gateway side by side on a fixed
//! cadence, joins both outcomes into one timestamped sample, and hands the
//! samples to a slower evaluator that persists only the anomalous ones.

pub mod diagnostics;
pub mod monitor;
pub mod probe;
pub mod sampling;
pub mod settings;

// Re-export main types
pub use diagnostics::{
    Classification, DiagnosticsEvaluator, EvaluationReport, GatewayStatus, Incident,
    IncidentSink,
};
pub use monitor::{Monitor, MonitorError, MonitorSummary};
pub use probe::{
    EchoOptions, EchoReply, EchoStatus, EchoTransport, IcmpTransport, ProbeExecutor,
    ProbeOutcome, ProbeTarget, TransportError,
};
pub use sampling::{Sample, SampleReceiver, SampleSender, SamplingScheduler, sample_queue};
pub use settings::{MonitorSettings, SettingsError};
