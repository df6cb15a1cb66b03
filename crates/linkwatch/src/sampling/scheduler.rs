use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, trace};

use super::queue::{QueueClosed, SampleSender};
use super::types::Sample;
use crate::probe::{ProbeExecutor, ProbeTarget};

/// Fault in the scheduler's own control flow. Ends the sampling loop.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to enqueue sample: {0}")]
    Queue(#[from] QueueClosed),
}

/// Sampling scheduler - probes both paths once per period
///
/// Pacing is anchored to the start of each tick: the period timer starts
/// alongside the probes, so slow probes do not push later ticks back, and a
/// tick whose probes outlast the period is followed immediately by the next.
pub struct SamplingScheduler {
    executor: Arc<ProbeExecutor>,
    external: ProbeTarget,
    gateway: ProbeTarget,
    period: Duration,
    queue: SampleSender,
}

impl SamplingScheduler {
    pub fn new(
        executor: Arc<ProbeExecutor>,
        external: ProbeTarget,
        gateway: ProbeTarget,
        period: Duration,
        queue: SampleSender,
    ) -> Self {
        Self { executor, external, gateway, period, queue }
    }

    /// Probe both targets concurrently and join the outcomes
    pub async fn sample(&self) -> Sample {
        let started_at = Utc::now();
        let (external, gateway) = tokio::join!(
            self.executor.probe(&self.external),
            self.executor.probe(&self.gateway),
        );
        Sample::new(started_at, external, gateway)
    }

    /// Run a single tick: sample, enqueue, then wait out the rest of the period
    pub async fn tick(&self) -> Result<(), SchedulerError> {
        let pacing = sleep(self.period);
        let sample = self.sample().await;
        trace!(started_at = %sample.started_at(), "sample ready");

        self.queue.push(sample)?;
        pacing.await;
        Ok(())
    }

    /// Tick until `shutdown` changes or a fault occurs
    ///
    /// Returns the number of completed ticks.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<u64, SchedulerError> {
        info!(
            external = %self.external,
            gateway = %self.gateway,
            period_ms = self.period.as_millis() as u64,
            "sampling started"
        );

        let mut ticks = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                result = self.tick() => result?,
            }
            ticks += 1;
        }

        info!(ticks, "sampling stopped");
        Ok(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{EchoOptions, EchoReply, EchoTransport, TransportError};
    use crate::sampling::queue::sample_queue;
    use async_trait::async_trait;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::time::Instant;

    const EXTERNAL: IpAddr = IpAddr::V4(Ipv4Addr::new(142, 250, 74, 36));
    const GATEWAY: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));

    /// Answers every echo with a success after `delay`, reporting the
    /// address-specific round trip
    struct DelayedTransport {
        delay: Duration,
    }

    #[async_trait]
    impl EchoTransport for DelayedTransport {
        async fn echo(
            &self,
            address: IpAddr,
            _timeout: Duration,
            _payload: &[u8],
            _options: EchoOptions,
        ) -> Result<EchoReply, TransportError> {
            sleep(self.delay).await;
            let rtt = if address == GATEWAY { 10 } else { 40 };
            Ok(EchoReply::success(Duration::from_millis(rtt)))
        }
    }

    fn scheduler(probe_delay: Duration, period: Duration) -> (SamplingScheduler, crate::sampling::SampleReceiver) {
        let executor = Arc::new(ProbeExecutor::new(
            Arc::new(DelayedTransport { delay: probe_delay }),
            Duration::from_millis(1000),
            vec![b'a'; 32],
            EchoOptions::default(),
        ));
        let (tx, rx) = sample_queue();
        let scheduler = SamplingScheduler::new(
            executor,
            ProbeTarget::Addr(EXTERNAL),
            ProbeTarget::Addr(GATEWAY),
            period,
            tx,
        );
        (scheduler, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_probes_run_concurrently() {
        let (scheduler, _rx) = scheduler(Duration::from_millis(80), Duration::from_millis(100));

        let start = Instant::now();
        let sample = scheduler.sample().await;

        // Sequential probes would take 160ms
        assert_eq!(start.elapsed(), Duration::from_millis(80));
        assert_eq!(sample.external().success_rtt(), Some(Duration::from_millis(40)));
        assert_eq!(sample.gateway().success_rtt(), Some(Duration::from_millis(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_probes_wait_out_the_period() {
        let (scheduler, mut rx) = scheduler(Duration::from_millis(10), Duration::from_millis(100));

        let start = Instant::now();
        scheduler.tick().await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(100));
        assert_eq!(rx.drain().samples.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probes_start_next_tick_immediately() {
        let (scheduler, mut rx) = scheduler(Duration::from_millis(300), Duration::from_millis(100));

        let start = Instant::now();
        scheduler.tick().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(300));

        scheduler.tick().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(600));

        let samples = rx.drain().samples;
        assert_eq!(samples.len(), 2);
        assert!(samples[0].started_at() <= samples[1].started_at());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let (scheduler, mut rx) = scheduler(Duration::from_millis(10), Duration::from_millis(100));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.run(stop_rx));
        sleep(Duration::from_millis(350)).await;
        stop_tx.send(true).unwrap();

        let ticks = handle.await.unwrap().unwrap();
        assert_eq!(ticks, 3);
        assert_eq!(rx.drain().samples.len(), 4);
    }

    #[tokio::test]
    async fn test_run_fails_when_queue_is_closed() {
        let (scheduler, rx) = scheduler(Duration::ZERO, Duration::from_millis(1));
        drop(rx);
        let (_stop_tx, stop_rx) = watch::channel(false);

        let result = scheduler.run(stop_rx).await;
        assert!(matches!(result, Err(SchedulerError::Queue(QueueClosed))));
    }
}
