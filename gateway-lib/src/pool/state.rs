use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

/// Per-target-IP success/failure counters, updated on every connection
/// return from the pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct IpStats {
    pub success: u64,
    pub failure: u64,
}

/// Ancillary pool bookkeeping, separate from the connection queues
/// themselves: target-IP lists (as seen by the monitor), the known-IP set
/// used to detect newly-appeared IPs, the pending-warmup queue, and
/// per-IP counters.
#[derive(Debug, Default)]
pub struct PoolState {
    pub target_ipv4: Vec<IpAddr>,
    pub target_ipv6: Vec<IpAddr>,
    /// Every IP ever seen for this domain. Monotonic: entries are never
    /// removed, even when the monitor stops reporting them.
    pub known_ips: HashSet<IpAddr>,
    pub pending_warmups: Vec<IpAddr>,
    pub auto_warmup_enabled: bool,
    pub stats: HashMap<IpAddr, IpStats>,
}

impl PoolState {
    /// Diffs `current` against `known_ips`, appending genuinely new IPs to
    /// `pending_warmups` and the relevant target list. Returns the newly
    /// appeared IPs.
    pub fn absorb_monitor_snapshot(&mut self, ipv4: &[IpAddr], ipv6: &[IpAddr]) -> Vec<IpAddr> {
        let mut new_ips = Vec::new();
        for &ip in ipv4 {
            if self.known_ips.insert(ip) {
                self.target_ipv4.push(ip);
                self.pending_warmups.push(ip);
                new_ips.push(ip);
            }
        }
        for &ip in ipv6 {
            if self.known_ips.insert(ip) {
                self.target_ipv6.push(ip);
                self.pending_warmups.push(ip);
                new_ips.push(ip);
            }
        }
        new_ips
    }

    pub fn take_pending_warmups(&mut self) -> Vec<IpAddr> {
        std::mem::take(&mut self.pending_warmups)
    }

    pub fn record_success(&mut self, ip: IpAddr) {
        self.stats.entry(ip).or_default().success += 1;
    }

    pub fn record_failure(&mut self, ip: IpAddr) {
        self.stats.entry(ip).or_default().failure += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_snapshot_is_monotonic() {
        let mut state = PoolState::default();
        let ip_a: IpAddr = "1.1.1.1".parse().unwrap();
        let ip_b: IpAddr = "2.2.2.2".parse().unwrap();

        let first = state.absorb_monitor_snapshot(&[ip_a], &[]);
        assert_eq!(first, vec![ip_a]);

        // ip_a disappears from the snapshot, ip_b appears: ip_a must stay known.
        let second = state.absorb_monitor_snapshot(&[ip_b], &[]);
        assert_eq!(second, vec![ip_b]);
        assert!(state.known_ips.contains(&ip_a));
        assert!(state.target_ipv4.contains(&ip_a));
    }

    #[test]
    fn pending_warmups_drain_exactly_once() {
        let mut state = PoolState::default();
        state.absorb_monitor_snapshot(&["1.1.1.1".parse().unwrap()], &[]);
        assert_eq!(state.take_pending_warmups().len(), 1);
        assert!(state.take_pending_warmups().is_empty());
    }
}
