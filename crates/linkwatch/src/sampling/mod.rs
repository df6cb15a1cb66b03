/// Sampling module - produces joined probe pairs on a fixed cadence
///
/// The scheduler is the only producer and the diagnostics evaluator the only
/// consumer of the sample queue.
pub mod queue;
pub mod scheduler;
pub mod types;

pub use queue::{Drain, QueueClosed, SampleReceiver, SampleSender, sample_queue};
pub use scheduler::{SamplingScheduler, SchedulerError};
pub use types::Sample;
