use std::net::{IpAddr, Ipv4Addr};

use ipnet::Ipv6Net;
use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::iface::{cidr_present, first_global_ipv6_64, has_ipv6_tunnel_path, list_interfaces};
use super::ipv6_gen::run_generator;

/// Local address a dial should bind to, or a signal to let the OS choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgressAddr {
    V4(Ipv4Addr),
    V6(std::net::Ipv6Addr),
    /// Tunnel mode: use IPv6 but do not bind a specific source address.
    NoBind,
}

enum Mode {
    Ipv4Static(Vec<Ipv4Addr>),
    Ipv6Generated {
        rx: mpsc::Receiver<std::net::Ipv6Addr>,
        cancel: CancellationToken,
        _generator: tokio::task::JoinHandle<()>,
    },
    Tunnel,
}

/// Chooses a source IP for each outbound dial: either a uniformly-picked
/// static IPv4 address, the next address from a lazily-generated IPv6 /64
/// sequence, or tunnel mode ("use IPv6, do not bind").
pub struct LocalEgressPool {
    mode: Mode,
}

impl LocalEgressPool {
    /// Resolves configuration into a concrete egress mode:
    /// - explicit `/64` CIDR present on an interface => generated IPv6
    /// - no CIDR but a global `/64` auto-detected => generated IPv6
    /// - no usable `/64` but a tunnel path exists => tunnel mode
    /// - otherwise => the static IPv4 set (possibly empty, meaning "let OS pick")
    pub fn new(static_ipv4: Vec<Ipv4Addr>, ipv6_cidr: Option<String>, queue_size: usize) -> Self {
        let interfaces = list_interfaces().unwrap_or_else(|e| {
            warn!(error = %e, "failed to enumerate interfaces, falling back to static IPv4");
            Vec::new()
        });

        let resolved_cidr = match ipv6_cidr {
            Some(raw) => match raw.parse::<Ipv6Net>() {
                Ok(cidr) if cidr_present(&interfaces, &cidr) => Some(cidr),
                Ok(cidr) => {
                    warn!(%cidr, "configured ipv6 cidr not present on any interface");
                    None
                }
                Err(e) => {
                    warn!(cidr = %raw, error = %e, "invalid ipv6 cidr, ignoring");
                    None
                }
            },
            None => first_global_ipv6_64(&interfaces),
        };

        if let Some(cidr) = resolved_cidr {
            info!(%cidr, "egress pool generating ipv6 addresses");
            let (tx, rx) = mpsc::channel(queue_size.max(1));
            let cancel = CancellationToken::new();
            let generator = tokio::spawn(run_generator(cidr, tx, cancel.clone()));
            return Self { mode: Mode::Ipv6Generated { rx, cancel, _generator: generator } };
        }

        if has_ipv6_tunnel_path(&interfaces) {
            info!("egress pool using ipv6 tunnel mode (no source bind)");
            return Self { mode: Mode::Tunnel };
        }

        Self { mode: Mode::Ipv4Static(static_ipv4) }
    }

    pub async fn get_ip(&mut self) -> Option<EgressAddr> {
        match &mut self.mode {
            Mode::Ipv6Generated { rx, .. } => rx.recv().await.map(EgressAddr::V6),
            Mode::Tunnel => Some(EgressAddr::NoBind),
            Mode::Ipv4Static(addrs) => {
                let mut rng = rand::rng();
                addrs.choose(&mut rng).copied().map(EgressAddr::V4)
            }
        }
    }

    pub fn close(&self) {
        if let Mode::Ipv6Generated { cancel, .. } = &self.mode {
            cancel.cancel();
        }
    }
}

impl Drop for LocalEgressPool {
    fn drop(&mut self) {
        self.close();
    }
}

impl From<EgressAddr> for Option<IpAddr> {
    fn from(value: EgressAddr) -> Self {
        match value {
            EgressAddr::V4(ip) => Some(IpAddr::V4(ip)),
            EgressAddr::V6(ip) => Some(IpAddr::V6(ip)),
            EgressAddr::NoBind => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_ipv4_mode_picks_from_configured_set() {
        let mut pool = LocalEgressPool {
            mode: Mode::Ipv4Static(vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()]),
        };
        for _ in 0..20 {
            let addr = pool.get_ip().await.unwrap();
            match addr {
                EgressAddr::V4(ip) => assert!(ip == "10.0.0.1".parse::<Ipv4Addr>().unwrap() || ip == "10.0.0.2".parse::<Ipv4Addr>().unwrap()),
                _ => panic!("expected V4"),
            }
        }
    }

    #[tokio::test]
    async fn tunnel_mode_always_returns_nobind() {
        let mut pool = LocalEgressPool { mode: Mode::Tunnel };
        assert_eq!(pool.get_ip().await, Some(EgressAddr::NoBind));
    }

    #[tokio::test]
    async fn ipv6_generated_mode_yields_addresses_in_prefix() {
        let prefix: Ipv6Net = "2001:db8::/64".parse().unwrap();
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let generator = tokio::spawn(run_generator(prefix, tx, cancel.clone()));
        let mut pool = LocalEgressPool {
            mode: Mode::Ipv6Generated { rx, cancel, _generator: generator },
        };
        for _ in 0..5 {
            match pool.get_ip().await.unwrap() {
                EgressAddr::V6(addr) => assert!(prefix.contains(&addr)),
                _ => panic!("expected V6"),
            }
        }
    }
}
