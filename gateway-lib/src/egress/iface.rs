use std::net::IpAddr;

/// A minimal, easily-synthesized view over one address bound to one local
/// network interface. Decoupled from `get_if_addrs::Interface` so the
/// selection logic in `egress::pool` can be unit-tested against hand-built
/// fixtures instead of the live network stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iface {
    pub name: String,
    pub ip: IpAddr,
}

/// Interface name prefixes associated with IPv6 tunnel transports (6to4,
/// Teredo, generic `sit`/`ip6tnl` tunnels).
const TUNNEL_PREFIXES: &[&str] = &["sit", "tun", "ip6tnl", "6to4", "teredo"];

pub fn list_interfaces() -> std::io::Result<Vec<Iface>> {
    let raw = get_if_addrs::get_if_addrs()?;
    Ok(raw
        .into_iter()
        .map(|i| Iface { name: i.name, ip: i.ip() })
        .collect())
}

pub fn is_global_ipv6(ip: &std::net::Ipv6Addr) -> bool {
    !ip.is_loopback()
        && !ip.is_unspecified()
        && !is_unique_local(ip)
        && !is_link_local(ip)
}

fn is_unique_local(ip: &std::net::Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xfe00) == 0xfc00
}

fn is_link_local(ip: &std::net::Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

/// First global-scope `/64` prefix seen among `interfaces`, if any.
pub fn first_global_ipv6_64(interfaces: &[Iface]) -> Option<ipnet::Ipv6Net> {
    interfaces.iter().find_map(|iface| match iface.ip {
        IpAddr::V6(addr) if is_global_ipv6(&addr) => {
            Some(ipnet::Ipv6Net::new(addr, 64).ok()?.trunc())
        }
        _ => None,
    })
}

/// Whether `cidr` matches some address actually configured on a non-loopback
/// interface (i.e. the configured prefix is routable from this host).
pub fn cidr_present(interfaces: &[Iface], cidr: &ipnet::Ipv6Net) -> bool {
    interfaces.iter().any(|iface| match iface.ip {
        IpAddr::V6(addr) => !addr.is_loopback() && cidr.contains(&addr),
        _ => false,
    })
}

/// Whether any interface looks like an up IPv6 tunnel transport, or any
/// interface otherwise carries a non-link-local IPv6 address — both treated
/// as "this host has some IPv6 routing path" for tunnel-mode detection.
pub fn has_ipv6_tunnel_path(interfaces: &[Iface]) -> bool {
    interfaces.iter().any(|iface| {
        let is_tunnel_name = TUNNEL_PREFIXES
            .iter()
            .any(|prefix| iface.name.to_lowercase().starts_with(prefix));
        let is_routable_v6 = matches!(iface.ip, IpAddr::V6(addr) if !addr.is_loopback() && !is_link_local(&addr));
        is_tunnel_name || is_routable_v6
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn iface(name: &str, ip: &str) -> Iface {
        Iface { name: name.to_string(), ip: ip.parse().unwrap() }
    }

    #[test]
    fn finds_first_global_ipv6_64() {
        let ifaces = vec![
            iface("lo", "::1"),
            iface("eth0", "fe80::1"),
            iface("eth0", "2001:db8:1234:5678::abcd"),
        ];
        let found = first_global_ipv6_64(&ifaces).unwrap();
        assert_eq!(found.to_string(), "2001:db8:1234:5678::/64");
    }

    #[test]
    fn no_global_ipv6_when_only_link_local() {
        let ifaces = vec![iface("lo", "::1"), iface("eth0", "fe80::1")];
        assert!(first_global_ipv6_64(&ifaces).is_none());
    }

    #[test]
    fn cidr_present_matches_configured_interface() {
        let ifaces = vec![iface("eth0", "2001:db8::5")];
        let cidr: ipnet::Ipv6Net = "2001:db8::/64".parse().unwrap();
        assert!(cidr_present(&ifaces, &cidr));
        let other: ipnet::Ipv6Net = "2001:dead::/64".parse().unwrap();
        assert!(!cidr_present(&ifaces, &other));
    }

    #[test]
    fn detects_tunnel_interface_by_name() {
        let ifaces = vec![iface("tun0", "10.8.0.2")];
        assert!(has_ipv6_tunnel_path(&ifaces));
    }

    #[test]
    fn detects_routable_ipv6_without_tunnel_name() {
        let ifaces = vec![iface("eth0", "2001:db8::1")];
        assert!(has_ipv6_tunnel_path(&ifaces));
    }

    #[test]
    fn is_global_excludes_unique_local_and_link_local() {
        assert!(!is_global_ipv6(&Ipv6Addr::from([0xfc00, 0, 0, 0, 0, 0, 0, 1])));
        assert!(!is_global_ipv6(&Ipv6Addr::from([0xfe80, 0, 0, 0, 0, 0, 0, 1])));
        assert!(is_global_ipv6(&"2001:db8::1".parse().unwrap()));
    }
}
