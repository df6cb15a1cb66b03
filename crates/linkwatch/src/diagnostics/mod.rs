/// Diagnostics module - turns queued samples into incident records
///
/// This module is responsible for:
/// - Classifying each sample by its external outcome
/// - Describing the gateway path at the same instant
/// - Formatting incident records and handing them to sinks
/// - Running the evaluation loop on its own cadence
pub mod classify;
pub mod evaluator;
pub mod incident;
pub mod sink;

pub use classify::{Classification, GatewayStatus, classify};
pub use evaluator::{DiagnosticsEvaluator, EvaluationReport};
pub use incident::Incident;
pub use sink::{ConsoleSink, IncidentSink, LogFileSink, SinkError};
