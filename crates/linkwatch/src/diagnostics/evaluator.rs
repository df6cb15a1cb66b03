use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::incident::Incident;
use super::sink::{ConsoleSink, IncidentSink, LogFileSink};
use crate::sampling::{Sample, SampleReceiver};
use crate::settings::MonitorSettings;

/// Counts for one or more evaluation passes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Samples taken off the queue
    pub processed: usize,
    /// Samples that produced an incident
    pub incidents: usize,
    /// Sink writes that failed
    pub write_failures: usize,
}

impl EvaluationReport {
    fn absorb(&mut self, other: EvaluationReport) {
        self.processed += other.processed;
        self.incidents += other.incidents;
        self.write_failures += other.write_failures;
    }
}

/// Diagnostics evaluator - drains the sample queue on a slow cadence
///
/// Healthy samples are dropped without any I/O. Anomalous ones become
/// incidents written to every sink in order. A failing sink is reported and
/// skipped; it never stops the loop.
pub struct DiagnosticsEvaluator {
    queue: SampleReceiver,
    sinks: Vec<Box<dyn IncidentSink>>,
    host: String,
    threshold: Duration,
    period: Duration,
}

impl DiagnosticsEvaluator {
    /// Create an evaluator with no sinks
    pub fn new(queue: SampleReceiver, host: String, threshold: Duration, period: Duration) -> Self {
        Self { queue, sinks: Vec::new(), host, threshold, period }
    }

    /// Create an evaluator writing to the configured log file and, if
    /// enabled, the console
    pub fn from_settings(queue: SampleReceiver, settings: &MonitorSettings) -> Self {
        let evaluator = Self::new(
            queue,
            settings.external_host.clone(),
            settings.latency_threshold,
            settings.evaluation_period(),
        )
        .with_sink(LogFileSink::new(settings.log_path.clone()));

        if settings.echo_to_console { evaluator.with_sink(ConsoleSink) } else { evaluator }
    }

    pub fn with_sink(mut self, sink: impl IncidentSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Drain whatever is queued right now and evaluate it
    ///
    /// Returns the report and whether the queue has closed.
    pub async fn evaluate_pending(&mut self) -> (EvaluationReport, bool) {
        let drain = self.queue.drain();
        let mut report = EvaluationReport::default();
        for sample in &drain.samples {
            report.absorb(self.evaluate(sample).await);
        }
        (report, drain.closed)
    }

    async fn evaluate(&self, sample: &Sample) -> EvaluationReport {
        let mut report = EvaluationReport { processed: 1, ..Default::default() };
        let Some(incident) = Incident::from_sample(sample, &self.host, self.threshold) else {
            return report;
        };

        report.incidents = 1;
        for sink in &self.sinks {
            if let Err(e) = sink.record(&incident).await {
                report.write_failures += 1;
                warn!(sink = sink.name(), "Failed to record incident: {}", e);
            }
        }
        report
    }

    /// Evaluate every cycle until `shutdown` changes or the queue closes
    ///
    /// After shutdown is requested the evaluator keeps consuming until the
    /// producer is gone, so samples already taken are not lost.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> EvaluationReport {
        info!(
            period_ms = self.period.as_millis() as u64,
            sinks = self.sinks.len(),
            "evaluation started"
        );

        let mut totals = EvaluationReport::default();
        loop {
            let (report, closed) = self.evaluate_pending().await;
            if report.processed > 0 {
                debug!(
                    processed = report.processed,
                    incidents = report.incidents,
                    write_failures = report.write_failures,
                    "evaluation cycle complete"
                );
            }
            totals.absorb(report);

            if closed {
                break;
            }

            tokio::select! {
                _ = sleep(self.period) => {}
                _ = shutdown.changed() => {
                    while let Some(sample) = self.queue.recv().await {
                        totals.absorb(self.evaluate(&sample).await);
                    }
                    break;
                }
            }
        }

        info!(
            processed = totals.processed,
            incidents = totals.incidents,
            write_failures = totals.write_failures,
            "evaluation stopped"
        );
        totals
    }
}
