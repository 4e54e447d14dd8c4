use serde::Deserialize;
use std::net::Ipv4Addr;

/// Hot connection pool configuration: egress addressing, warmup behavior,
/// and the background maintenance cadence for one target domain.
#[derive(Debug, Deserialize, Clone)]
pub struct HotPoolConfig {
    /// Static local IPv4 address to bind outbound sockets to.
    /// Mutually exclusive with `local_ipv6_cidr`; at most one egress mode
    /// is active at a time.
    #[serde(default)]
    pub local_ipv4: Option<Ipv4Addr>,
    /// IPv6 /64 prefix to generate random egress addresses from.
    #[serde(default)]
    pub local_ipv6_cidr: Option<String>,
    /// Depth of the background-generated IPv6 address queue.
    #[serde(default = "default_ipv6_queue_size")]
    pub ipv6_queue_size: usize,
    /// Domain this pool keeps connections warm for.
    pub target_domain: String,
    /// TCP port on the target domain.
    #[serde(default = "default_target_port")]
    pub target_port: u16,
    /// Maximum number of concurrently held connections.
    pub max_conns: usize,
    /// Accepted for config compatibility; the pool never evicts idle
    /// connections on a timer (see `pool::hot_pool`), so this value is
    /// stored but not acted on.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u64,
    /// Request path used to warm a freshly created connection.
    pub warmup_path: String,
    /// HTTP method used for the warmup request.
    #[serde(default = "default_warmup_method")]
    pub warmup_method: String,
    /// Number of warmup requests allowed in flight at once.
    #[serde(default = "default_warmup_concurrency")]
    pub warmup_concurrency: usize,
    /// Expected response body length for a successful warmup probe.
    #[serde(default = "default_warmup_expected_len")]
    pub warmup_expected_len: usize,
    /// How often blacklisted target IPs are retested, in minutes.
    #[serde(default = "default_blacklist_retest_interval")]
    pub blacklist_retest_interval_minutes: u64,
    /// How often the target IP pool is refreshed from the domain monitor.
    #[serde(default = "default_ip_refresh_interval")]
    pub ip_refresh_interval_minutes: u64,
    /// Named fingerprint profile to pin connections in this pool to.
    /// `None` lets the fingerprint library pick a random profile per connection.
    #[serde(default)]
    pub fingerprint_name: Option<String>,
}

fn default_ipv6_queue_size() -> usize {
    100
}

fn default_target_port() -> u16 {
    443
}

fn default_idle_timeout() -> u64 {
    30
}

fn default_warmup_method() -> String {
    "GET".to_string()
}

fn default_warmup_concurrency() -> usize {
    4
}

fn default_warmup_expected_len() -> usize {
    13
}

fn default_blacklist_retest_interval() -> u64 {
    5
}

fn default_ip_refresh_interval() -> u64 {
    10
}
