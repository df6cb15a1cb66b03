use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use std::time::Duration;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use tracing::trace;

use super::transport::{EchoTransport, TransportError};
use super::types::{EchoOptions, EchoReply, EchoStatus};

/// ICMP echo over `surge-ping`
///
/// Every call opens its own socket and closes it before returning. Opening
/// the socket needs either `CAP_NET_RAW` or an unprivileged ICMP socket
/// range (`net.ipv4.ping_group_range`) that covers the running group.
#[derive(Debug, Default, Clone, Copy)]
pub struct IcmpTransport;

impl IcmpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EchoTransport for IcmpTransport {
    async fn echo(
        &self,
        address: IpAddr,
        timeout: Duration,
        payload: &[u8],
        options: EchoOptions,
    ) -> Result<EchoReply, TransportError> {
        let kind = match address {
            IpAddr::V4(_) => ICMP::V4,
            IpAddr::V6(_) => ICMP::V6,
        };
        trace!(
            %address,
            dont_fragment = options.dont_fragment,
            scope_id = options.scope_id,
            "sending echo request"
        );

        let client = Client::new(&Config::builder().kind(kind).build())
            .map_err(TransportError::Socket)?;
        set_dont_fragment(&client, kind, options.dont_fragment).map_err(TransportError::Socket)?;

        let mut pinger = client.pinger(address, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);
        if let Some(scope_id) = options.scope_id {
            pinger.scope_id(scope_id);
        }

        match pinger.ping(PingSequence(0), payload).await {
            Ok((_packet, rtt)) => Ok(EchoReply::success(rtt)),
            Err(SurgeError::Timeout { .. }) => Ok(EchoReply::new(EchoStatus::TimedOut, timeout)),
            Err(SurgeError::IOError(e)) => Err(TransportError::Io(e)),
            Err(e) => Err(TransportError::Other(e.to_string())),
        }
    }
}

#[cfg(target_os = "linux")]
fn set_dont_fragment(client: &Client, kind: ICMP, dont_fragment: bool) -> io::Result<()> {
    mtu_discover::set(client.get_socket().get_native_sock(), kind, dont_fragment)
}

#[cfg(not(target_os = "linux"))]
fn set_dont_fragment(_client: &Client, _kind: ICMP, dont_fragment: bool) -> io::Result<()> {
    trace!(dont_fragment, "don't-fragment left to the platform default");
    Ok(())
}

/// Path MTU discovery mode, which decides the DF bit on Linux
#[cfg(target_os = "linux")]
mod mtu_discover {
    use std::io;
    use std::os::fd::RawFd;
    use surge_ping::ICMP;

    /// `IP_PMTUDISC_DO` sets DF on every datagram, `IP_PMTUDISC_DONT` never does
    pub(super) fn set(fd: RawFd, kind: ICMP, dont_fragment: bool) -> io::Result<()> {
        let (level, name, value) = match kind {
            ICMP::V4 => (
                libc::IPPROTO_IP,
                libc::IP_MTU_DISCOVER,
                if dont_fragment { libc::IP_PMTUDISC_DO } else { libc::IP_PMTUDISC_DONT },
            ),
            ICMP::V6 => (
                libc::IPPROTO_IPV6,
                libc::IPV6_MTU_DISCOVER,
                if dont_fragment { libc::IPV6_PMTUDISC_DO } else { libc::IPV6_PMTUDISC_DONT },
            ),
        };

        // SAFETY: `fd` is an open socket for the duration of the call and
        // `value` is the c_int this option expects.
        let result = unsafe {
            libc::setsockopt(
                fd,
                level,
                name,
                (&raw const value).cast::<libc::c_void>(),
                size_of::<libc::c_int>() as libc::socklen_t,
            )
        };

        if result == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
    }

}
