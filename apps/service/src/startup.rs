//! Resolves the monitor's two targets before any loop starts.

use async_trait::async_trait;
use linkwatch::ProbeTarget;
use std::io;
use std::net::IpAddr;
use thiserror::Error;
use tracing::{debug, info};

use crate::route;

/// Fatal condition found before monitoring begins
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Could not resolve {host}.")]
    Unresolved {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("Could not resolve {host}.")]
    NoAddresses { host: String },
    #[error("Could not find gateway for {host}. Very odd.")]
    NoGateway { host: String },
    #[error("Could not read the routing table: {0}")]
    RouteTable(#[source] io::Error),
}

impl StartupError {
    /// Follow-up line shown to the operator
    pub fn hint(&self) -> &'static str {
        match self {
            StartupError::Unresolved { .. } | StartupError::NoAddresses { .. } => {
                "Check your Internet connection."
            }
            StartupError::NoGateway { .. } => "Double-check your Internet connection.",
            StartupError::RouteTable(_) => "Set target.gateway in the config to skip the lookup.",
        }
    }
}

/// Host name resolution
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Next hop towards a destination, ready to be probed
#[async_trait]
pub trait GatewayLookup: Send + Sync {
    async fn gateway_for(&self, destination: IpAddr) -> io::Result<Option<ProbeTarget>>;
}

/// Resolver backed by the system's `getaddrinfo`
pub struct SystemResolver;

#[async_trait]
impl NameResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addresses = tokio::net::lookup_host((host, 0)).await?;
        Ok(addresses.map(|socket| socket.ip()).collect())
    }
}

/// Gateway lookup from the kernel routing tables
pub struct KernelRoutes;

#[async_trait]
impl GatewayLookup for KernelRoutes {
    async fn gateway_for(&self, destination: IpAddr) -> io::Result<Option<ProbeTarget>> {
        match route::gateway_for(destination).await? {
            Some(gateway) => {
                debug!(gateway = %gateway.address, interface = %gateway.interface, "Found route");
                gateway.probe_target().await.map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Addresses the monitor starts with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupPlan {
    /// First resolved address of the external host
    pub external: IpAddr,
    pub gateway: ProbeTarget,
}

/// Resolve the external host and find the gateway towards it
///
/// A configured `gateway_override` skips the routing table, but the host
/// must still resolve.
pub async fn prepare(
    host: &str,
    gateway_override: Option<IpAddr>,
    resolver: &dyn NameResolver,
    routes: &dyn GatewayLookup,
) -> Result<StartupPlan, StartupError> {
    let addresses = resolver
        .resolve(host)
        .await
        .map_err(|source| StartupError::Unresolved { host: host.to_string(), source })?;
    debug!(host, count = addresses.len(), "Resolved external host");

    let external = *addresses
        .first()
        .ok_or_else(|| StartupError::NoAddresses { host: host.to_string() })?;

    let gateway = match gateway_override {
        Some(gateway) => {
            info!(%gateway, "Using configured gateway");
            ProbeTarget::Addr(gateway)
        }
        None => routes
            .gateway_for(external)
            .await
            .map_err(StartupError::RouteTable)?
            .ok_or_else(|| StartupError::NoGateway { host: host.to_string() })?,
    };

    Ok(StartupPlan { external, gateway })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const EXTERNAL: IpAddr = IpAddr::V4(Ipv4Addr::new(142, 250, 74, 36));
    const GATEWAY: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));

    struct FixedResolver(io::Result<Vec<IpAddr>>);

    #[async_trait]
    impl NameResolver for FixedResolver {
        async fn resolve(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            match &self.0 {
                Ok(addresses) => Ok(addresses.clone()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    struct FixedRoutes(Option<ProbeTarget>);

    #[async_trait]
    impl GatewayLookup for FixedRoutes {
        async fn gateway_for(&self, _destination: IpAddr) -> io::Result<Option<ProbeTarget>> {
            Ok(self.0.clone())
        }
    }

    fn via(gateway: IpAddr) -> FixedRoutes {
        FixedRoutes(Some(ProbeTarget::Addr(gateway)))
    }

    struct UnreadableRoutes;

    #[async_trait]
    impl GatewayLookup for UnreadableRoutes {
        async fn gateway_for(&self, _destination: IpAddr) -> io::Result<Option<ProbeTarget>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no /proc"))
        }
    }

    #[tokio::test]
    async fn test_prepare_resolves_both_targets() {
        let resolver = FixedResolver(Ok(vec![EXTERNAL, "2a00:1450::1".parse().unwrap()]));
        let plan = prepare("www.google.com", None, &resolver, &via(GATEWAY))
            .await
            .unwrap();

        assert_eq!(plan, StartupPlan { external: EXTERNAL, gateway: ProbeTarget::Addr(GATEWAY) });
    }

    #[tokio::test]
    async fn test_scoped_gateway_is_kept() {
        let external: IpAddr = "2a00:1450:4001::68".parse().unwrap();
        let resolver = FixedResolver(Ok(vec![external, EXTERNAL]));
        let scoped = ProbeTarget::Scoped { address: "fe80::1".parse().unwrap(), scope_id: 2 };
        let plan = prepare("www.google.com", None, &resolver, &FixedRoutes(Some(scoped.clone())))
            .await
            .unwrap();

        assert_eq!(plan.external, external);
        assert_eq!(plan.gateway, scoped);
    }

    #[tokio::test]
    async fn test_unresolved_host_is_fatal() {
        let resolver = FixedResolver(Err(io::Error::other("failed to lookup address")));
        let error = prepare("www.google.com", None, &resolver, &via(GATEWAY))
            .await
            .unwrap_err();

        assert!(matches!(error, StartupError::Unresolved { .. }));
        assert_eq!(error.to_string(), "Could not resolve www.google.com.");
        assert_eq!(error.hint(), "Check your Internet connection.");
    }

    #[tokio::test]
    async fn test_empty_resolution_is_fatal() {
        let resolver = FixedResolver(Ok(Vec::new()));
        let error = prepare("www.google.com", None, &resolver, &via(GATEWAY))
            .await
            .unwrap_err();

        assert!(matches!(error, StartupError::NoAddresses { .. }));
    }

    #[tokio::test]
    async fn test_missing_gateway_is_fatal() {
        let resolver = FixedResolver(Ok(vec![EXTERNAL]));
        let error = prepare("www.google.com", None, &resolver, &FixedRoutes(None))
            .await
            .unwrap_err();

        assert!(matches!(error, StartupError::NoGateway { .. }));
        assert_eq!(error.to_string(), "Could not find gateway for www.google.com. Very odd.");
        assert_eq!(error.hint(), "Double-check your Internet connection.");
    }

    #[tokio::test]
    async fn test_gateway_override_skips_routing_table() {
        let resolver = FixedResolver(Ok(vec![EXTERNAL]));
        let configured: IpAddr = "192.168.4.1".parse().unwrap();
        let plan = prepare("www.google.com", Some(configured), &resolver, &UnreadableRoutes)
            .await
            .unwrap();

        assert_eq!(plan.gateway, ProbeTarget::Addr(configured));
    }

    #[tokio::test]
    async fn test_unreadable_routing_table_is_fatal() {
        let resolver = FixedResolver(Ok(vec![EXTERNAL]));
        let error = prepare("www.google.com", None, &resolver, &UnreadableRoutes)
            .await
            .unwrap_err();

        assert!(matches!(error, StartupError::RouteTable(_)));
    }
}
