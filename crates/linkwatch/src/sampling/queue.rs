use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError};

use super::types::Sample;

/// Push on a queue whose consumer has gone away
#[derive(Debug, Error, PartialEq, Eq)]
#[error("sample queue closed: the evaluator is no longer receiving")]
pub struct QueueClosed;

/// Create an unbounded FIFO hand-off between scheduler and evaluator
pub fn sample_queue() -> (SampleSender, SampleReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SampleSender { tx }, SampleReceiver { rx })
}

/// Producer side. Pushing never waits on the consumer.
#[derive(Debug, Clone)]
pub struct SampleSender {
    tx: mpsc::UnboundedSender<Sample>,
}

impl SampleSender {
    pub fn push(&self, sample: Sample) -> Result<(), QueueClosed> {
        self.tx.send(sample).map_err(|_| QueueClosed)
    }
}

/// Everything that was queued at the moment of a drain
#[derive(Debug, Default)]
pub struct Drain {
    /// Samples in insertion order
    pub samples: Vec<Sample>,

    /// All producers are gone and nothing more will arrive
    pub closed: bool,
}

/// Consumer side
#[derive(Debug)]
pub struct SampleReceiver {
    rx: mpsc::UnboundedReceiver<Sample>,
}

impl SampleReceiver {
    /// Pop until the queue is empty without waiting
    pub fn drain(&mut self) -> Drain {
        let mut drain = Drain::default();
        loop {
            match self.rx.try_recv() {
                Ok(sample) => drain.samples.push(sample),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    drain.closed = true;
                    break;
                }
            }
        }
        drain
    }

    /// Wait for the next sample; `None` once every producer is gone and the
    /// queue is empty
    pub async fn recv(&mut self) -> Option<Sample> {
        self.rx.recv().await
    }
}
