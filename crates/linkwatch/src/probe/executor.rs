use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::time::timeout;

use super::transport::EchoTransport;
use super::types::{EchoOptions, EchoReply, EchoStatus, ProbeOutcome, ProbeTarget};
use crate::settings::MonitorSettings;

/// Probe executor - runs one bounded echo per call
///
/// `probe` never returns an error. Resolution failures, transport errors and
/// timeouts all end up in the returned `ProbeOutcome`.
pub struct ProbeExecutor {
    transport: Arc<dyn EchoTransport>,
    timeout: Duration,
    payload: Vec<u8>,
    options: EchoOptions,
}

impl ProbeExecutor {
    pub fn new(
        transport: Arc<dyn EchoTransport>,
        timeout: Duration,
        payload: Vec<u8>,
        options: EchoOptions,
    ) -> Self {
        Self { transport, timeout, payload, options }
    }

    /// Create an executor using the probe settings
    pub fn from_settings(transport: Arc<dyn EchoTransport>, settings: &MonitorSettings) -> Self {
        Self::new(transport, settings.probe_timeout, settings.payload(), settings.echo_options())
    }

    /// Probe `target` once
    ///
    /// The whole probe, name resolution included, is bounded by the probe
    /// timeout. Hitting it yields a `TimedOut` reply.
    pub async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        let attempt = async {
            let (address, scope_id) = match resolve(target).await {
                Ok(resolved) => resolved,
                Err(message) => return ProbeOutcome::failed(message),
            };
            let options = EchoOptions { scope_id, ..self.options };

            match self.transport.echo(address, self.timeout, &self.payload, options).await {
                Ok(reply) => ProbeOutcome::replied(reply),
                Err(e) => ProbeOutcome::failed(e.to_string()),
            }
        };

        match timeout(self.timeout, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::replied(EchoReply::new(EchoStatus::TimedOut, self.timeout)),
        }
    }
}

/// Address to send to, plus the interface index for scoped targets
async fn resolve(target: &ProbeTarget) -> Result<(IpAddr, Option<u32>), String> {
    match target {
        ProbeTarget::Addr(address) => Ok((*address, None)),
        ProbeTarget::Scoped { address, scope_id } => Ok((IpAddr::V6(*address), Some(*scope_id))),
        ProbeTarget::Host(name) => lookup_host((name.as_str(), 0))
            .await
            .map_err(|e| format!("could not resolve {name}: {e}"))?
            .next()
            .map(|socket| (socket.ip(), None))
            .ok_or_else(|| format!("no addresses found for {name}")),
    }
}
