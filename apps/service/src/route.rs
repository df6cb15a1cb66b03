//! Gateway lookup from the kernel routing tables.
//!
//! Parsers are pure functions over the text of `/proc/net/route` and
//! `/proc/net/ipv6_route` so they can be tested with string inputs.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;

use linkwatch::ProbeTarget;

const IPV4_ROUTES: &str = "/proc/net/route";
const IPV6_ROUTES: &str = "/proc/net/ipv6_route";
const SYS_CLASS_NET: &str = "/sys/class/net";

const RTF_UP: u32 = 0x0001;
const RTF_GATEWAY: u32 = 0x0002;

/// Parsing failure for a routing table line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed route entry on line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

/// One routing table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub interface: String,
    pub destination: IpAddr,
    pub prefix_len: u8,
    pub gateway: Option<IpAddr>,
    pub metric: u32,
    pub flags: u32,
}

impl Route {
    fn is_up(&self) -> bool {
        self.flags & RTF_UP != 0
    }

    fn matches(&self, address: IpAddr) -> bool {
        match (self.destination, address) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = prefix_mask_v4(self.prefix_len);
                u32::from(net) & mask == u32::from(addr) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = prefix_mask_v6(self.prefix_len);
                u128::from(net) & mask == u128::from(addr) & mask
            }
            _ => false,
        }
    }
}

fn prefix_mask_v4(len: u8) -> u32 {
    match len {
        0 => 0,
        len => u32::MAX << (32 - u32::from(len.min(32))),
    }
}

fn prefix_mask_v6(len: u8) -> u128 {
    match len {
        0 => 0,
        len => u128::MAX << (128 - u32::from(len.min(128))),
    }
}

/// Parses `/proc/net/route` content.
///
/// Addresses are printed as hex of the in-memory value, so they are decoded
/// with native byte order.
pub fn parse_ipv4_routes(content: &str) -> Result<Vec<Route>, ParseError> {
    let mut routes = Vec::new();
    for (index, line) in content.lines().enumerate().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 8 {
            return Err(ParseError::new(index + 1, "expected at least 8 fields"));
        }

        let hex_u32 = |field: &str, name: &str| {
            u32::from_str_radix(field, 16)
                .map_err(|_| ParseError::new(index + 1, format!("bad {name} `{field}`")))
        };
        let destination = Ipv4Addr::from(hex_u32(fields[1], "destination")?.to_ne_bytes());
        let gateway = Ipv4Addr::from(hex_u32(fields[2], "gateway")?.to_ne_bytes());
        let flags = hex_u32(fields[3], "flags")?;
        let metric = fields[6]
            .parse()
            .map_err(|_| ParseError::new(index + 1, format!("bad metric `{}`", fields[6])))?;
        let mask = Ipv4Addr::from(hex_u32(fields[7], "mask")?.to_ne_bytes());

        routes.push(Route {
            interface: fields[0].to_string(),
            destination: IpAddr::V4(destination),
            prefix_len: u32::from(mask).count_ones() as u8,
            gateway: (flags & RTF_GATEWAY != 0 && !gateway.is_unspecified())
                .then_some(IpAddr::V4(gateway)),
            metric,
            flags,
        });
    }
    Ok(routes)
}

/// Parses `/proc/net/ipv6_route` content.
///
/// Format: dest dest_plen src src_plen next_hop metric refcnt use flags iface
pub fn parse_ipv6_routes(content: &str) -> Result<Vec<Route>, ParseError> {
    let mut routes = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 10 {
            return Err(ParseError::new(index + 1, "expected 10 fields"));
        }

        let bad = |name: &str, field: &str| ParseError::new(index + 1, format!("bad {name} `{field}`"));
        let destination = u128::from_str_radix(fields[0], 16).map_err(|_| bad("destination", fields[0]))?;
        let prefix_len = u8::from_str_radix(fields[1], 16).map_err(|_| bad("prefix", fields[1]))?;
        let next_hop = u128::from_str_radix(fields[4], 16).map_err(|_| bad("next hop", fields[4]))?;
        let metric = u32::from_str_radix(fields[5], 16).map_err(|_| bad("metric", fields[5]))?;
        let flags = u32::from_str_radix(fields[8], 16).map_err(|_| bad("flags", fields[8]))?;

        let next_hop = Ipv6Addr::from(next_hop);
        routes.push(Route {
            interface: fields[9].to_string(),
            destination: IpAddr::V6(Ipv6Addr::from(destination)),
            prefix_len,
            gateway: (flags & RTF_GATEWAY != 0 && !next_hop.is_unspecified())
                .then_some(IpAddr::V6(next_hop)),
            metric,
            flags,
        });
    }
    Ok(routes)
}

/// Next hop and the interface it sits behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    pub address: IpAddr,
    pub interface: String,
}

impl Gateway {
    /// Probe target for this gateway
    ///
    /// A link-local IPv6 next hop is only reachable through its interface,
    /// so the target carries that interface's index.
    pub async fn probe_target(self) -> io::Result<ProbeTarget> {
        self.probe_target_in(Path::new(SYS_CLASS_NET)).await
    }

    async fn probe_target_in(self, sys_class_net: &Path) -> io::Result<ProbeTarget> {
        match self.address {
            IpAddr::V6(address) if address.is_unicast_link_local() => {
                let scope_id = interface_index(sys_class_net, &self.interface).await?;
                Ok(ProbeTarget::Scoped { address, scope_id })
            }
            address => Ok(ProbeTarget::Addr(address)),
        }
    }
}

async fn interface_index(sys_class_net: &Path, interface: &str) -> io::Result<u32> {
    let path = sys_class_net.join(interface).join("ifindex");
    let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
        io::Error::new(e.kind(), format!("reading index of interface {interface}: {e}"))
    })?;
    raw.trim().parse().map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidData, format!("bad index `{}` for {interface}", raw.trim()))
    })
}

/// Gateway used to reach `destination`
///
/// Picks the longest matching prefix among routes that are up, then the
/// lowest metric. `None` when the best route is on-link or nothing matches.
pub fn best_gateway(routes: &[Route], destination: IpAddr) -> Option<Gateway> {
    routes
        .iter()
        .filter(|route| route.is_up() && route.matches(destination))
        .max_by(|a, b| a.prefix_len.cmp(&b.prefix_len).then(b.metric.cmp(&a.metric)))
        .and_then(|route| {
            route.gateway.map(|address| Gateway { address, interface: route.interface.clone() })
        })
}

/// Look up the gateway for `destination` in the kernel routing table
pub async fn gateway_for(destination: IpAddr) -> io::Result<Option<Gateway>> {
    let (path, parse): (_, fn(&str) -> Result<Vec<Route>, ParseError>) = match destination {
        IpAddr::V4(_) => (IPV4_ROUTES, parse_ipv4_routes),
        IpAddr::V6(_) => (IPV6_ROUTES, parse_ipv6_routes),
    };

    let content = tokio::fs::read_to_string(path).await?;
    let routes = parse(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(best_gateway(&routes, destination))
}
