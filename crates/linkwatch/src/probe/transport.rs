use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

use super::types::{EchoOptions, EchoReply};

/// Failure of the echo primitive itself
///
/// A reply with a non-success status is not a transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open ICMP socket: {0}")]
    Socket(#[source] io::Error),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(String),
}

/// ICMP echo primitive
#[async_trait]
pub trait EchoTransport: Send + Sync {
    /// Send one echo request to `address` and wait up to `timeout` for the reply
    async fn echo(
        &self,
        address: IpAddr,
        timeout: Duration,
        payload: &[u8],
        options: EchoOptions,
    ) -> Result<EchoReply, TransportError>;
}
