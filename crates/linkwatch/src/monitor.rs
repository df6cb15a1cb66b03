//! Wiring for the two monitor loops.

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::info;

use crate::diagnostics::{DiagnosticsEvaluator, EvaluationReport};
use crate::probe::{EchoTransport, ProbeExecutor, ProbeTarget};
use crate::sampling::{SamplingScheduler, SchedulerError, sample_queue};
use crate::settings::MonitorSettings;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("sampling loop failed: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("monitor task failed: {0}")]
    Task(#[from] JoinError),
}

/// What a finished monitor run did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Completed scheduler ticks
    pub ticks: u64,
    pub evaluation: EvaluationReport,
}

/// Runs the sampling scheduler and the diagnostics evaluator side by side
pub struct Monitor {
    settings: MonitorSettings,
    gateway: ProbeTarget,
    transport: Arc<dyn EchoTransport>,
}

impl Monitor {
    pub fn new(
        settings: MonitorSettings,
        gateway: ProbeTarget,
        transport: Arc<dyn EchoTransport>,
    ) -> Self {
        Self { settings, gateway, transport }
    }

    /// Run both loops until `shutdown` resolves or the scheduler fails
    ///
    /// Either way the evaluator finishes with every sample the scheduler
    /// managed to enqueue before this returns.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<MonitorSummary, MonitorError> {
        let (queue_tx, queue_rx) = sample_queue();
        let (stop_tx, stop_rx) = watch::channel(false);

        let executor = Arc::new(ProbeExecutor::from_settings(self.transport, &self.settings));
        let scheduler = SamplingScheduler::new(
            executor,
            ProbeTarget::Host(self.settings.external_host.clone()),
            self.gateway,
            self.settings.sampling_period,
            queue_tx,
        );
        let evaluator = DiagnosticsEvaluator::from_settings(queue_rx, &self.settings);

        let evaluator_task = tokio::spawn(evaluator.run(stop_rx.clone()));
        let mut scheduler_task = tokio::spawn(scheduler.run(stop_rx));

        tokio::pin!(shutdown);
        let scheduled = tokio::select! {
            joined = &mut scheduler_task => joined,
            () = &mut shutdown => {
                info!("Shutdown requested, stopping monitor");
                let _ = stop_tx.send(true);
                (&mut scheduler_task).await
            }
        };

        // The scheduler is gone and its queue sender with it
        let _ = stop_tx.send(true);
        let evaluation = evaluator_task.await?;

        let ticks = scheduled??;
        Ok(MonitorSummary { ticks, evaluation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::QueueClosed;

    #[test]
    fn test_scheduler_fault_keeps_its_cause() {
        let error = MonitorError::from(SchedulerError::Queue(QueueClosed));
        assert!(matches!(error, MonitorError::Scheduler(SchedulerError::Queue(_))));
        assert!(error.to_string().starts_with("sampling loop failed: failed to enqueue sample"));
    }
}
