//! Monitor settings shared by the sampling and evaluation loops.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::probe::EchoOptions;

pub const DEFAULT_EXTERNAL_HOST: &str = "www.google.com";
pub const DEFAULT_LOG_PATH: &str = "out.log";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_SAMPLING_PERIOD: Duration = Duration::from_millis(100);
pub const DEFAULT_LATENCY_THRESHOLD: Duration = Duration::from_millis(120);
pub const DEFAULT_PAYLOAD_SIZE: usize = 32;
pub const DEFAULT_EVALUATION_MULTIPLIER: u32 = 100;

/// Largest ICMP payload that fits in one IPv4 datagram
pub const MAX_PAYLOAD_SIZE: usize = 65_500;

const MAX_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("external host must not be empty")]
    EmptyHost,
    #[error("sampling period must be greater than zero")]
    ZeroSamplingPeriod,
    #[error("probe timeout must be between 1ms and {max:?} (got {got:?})")]
    ProbeTimeout { got: Duration, max: Duration },
    #[error("evaluation multiplier must be at least 1")]
    ZeroMultiplier,
    #[error("payload size {got} exceeds the maximum of {max} bytes")]
    PayloadTooLarge { got: usize, max: usize },
}

/// Everything the monitor loops need, passed in at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Host name probed on the external path
    pub external_host: String,

    /// Per-probe timeout
    pub probe_timeout: Duration,

    /// Echo payload length in bytes
    pub payload_size: usize,

    /// Request the don't-fragment bit on outgoing echoes
    pub dont_fragment: bool,

    /// Time between the starts of consecutive ticks
    pub sampling_period: Duration,

    /// External round trips above this are anomalies
    pub latency_threshold: Duration,

    /// Evaluation cycle length as a multiple of the sampling period
    pub evaluation_multiplier: u32,

    /// Append-only incident log
    pub log_path: PathBuf,

    /// Mirror incidents to stdout
    pub echo_to_console: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            external_host: DEFAULT_EXTERNAL_HOST.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            dont_fragment: true,
            sampling_period: DEFAULT_SAMPLING_PERIOD,
            latency_threshold: DEFAULT_LATENCY_THRESHOLD,
            evaluation_multiplier: DEFAULT_EVALUATION_MULTIPLIER,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            echo_to_console: true,
        }
    }
}

impl MonitorSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.external_host.trim().is_empty() {
            return Err(SettingsError::EmptyHost);
        }

        if self.sampling_period.is_zero() {
            return Err(SettingsError::ZeroSamplingPeriod);
        }

        if self.probe_timeout < Duration::from_millis(1) || self.probe_timeout > MAX_PROBE_TIMEOUT {
            return Err(SettingsError::ProbeTimeout {
                got: self.probe_timeout,
                max: MAX_PROBE_TIMEOUT,
            });
        }

        if self.evaluation_multiplier == 0 {
            return Err(SettingsError::ZeroMultiplier);
        }

        if self.payload_size > MAX_PAYLOAD_SIZE {
            return Err(SettingsError::PayloadTooLarge {
                got: self.payload_size,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(())
    }

    /// Length of one evaluator cycle
    pub fn evaluation_period(&self) -> Duration {
        self.sampling_period.saturating_mul(self.evaluation_multiplier)
    }

    /// Echo payload: `payload_size` ASCII `a` bytes
    pub fn payload(&self) -> Vec<u8> {
        vec![b'a'; self.payload_size]
    }

    pub fn echo_options(&self) -> EchoOptions {
        EchoOptions { dont_fragment: self.dont_fragment, scope_id: None }
    }
}
