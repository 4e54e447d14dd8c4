use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Optional geolocation metadata attached to a resolved target IP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoInfo {
    pub country: Option<String>,
    pub city: Option<String>,
    pub asn: Option<u32>,
}

/// One resolved IP for a monitored domain. The IP is the identity: two
/// records with the same `ip` are the same record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetIpRecord {
    pub ip: IpAddr,
    #[serde(rename = "ip_info")]
    pub metadata: Option<GeoInfo>,
}

impl TargetIpRecord {
    pub fn new(ip: IpAddr) -> Self {
        Self { ip, metadata: None }
    }
}

/// A domain's accumulated, deduplicated IPv4/IPv6 record sets, as persisted
/// to disk and returned by `DomainIpMonitor::get_domain_pool`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DomainPool {
    pub ipv4: Vec<TargetIpRecord>,
    pub ipv6: Vec<TargetIpRecord>,
}

impl DomainPool {
    /// Inserts `record` into the collection matching its IP family, unless
    /// an entry with the same IP is already present. Records are never
    /// removed here — the monitor's accumulation is append-only.
    pub fn insert(&mut self, record: TargetIpRecord) {
        let bucket = match record.ip {
            IpAddr::V4(_) => &mut self.ipv4,
            IpAddr::V6(_) => &mut self.ipv6,
        };
        if !bucket.iter().any(|r| r.ip == record.ip) {
            bucket.push(record);
        }
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.ipv4.iter().any(|r| &r.ip == ip) || self.ipv6.iter().any(|r| &r.ip == ip)
    }

    pub fn all_ips(&self) -> Vec<IpAddr> {
        self.ipv4.iter().chain(self.ipv6.iter()).map(|r| r.ip).collect()
    }
}
