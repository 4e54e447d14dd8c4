use serde::Deserialize;

/// Dispatch-level admission pool configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct PoolConfig {
    /// Admission semaphore capacity: maximum in-flight `Execute` calls.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// How often blacklisted target IPs are retested, in minutes.
    #[serde(default = "default_rehab_interval")]
    pub rehabilitation_interval_minutes: u64,
    /// Accepted for config compatibility; the hot pool never evicts
    /// connections on idleness alone (see `pool::hot_pool`), so this value
    /// is stored but not acted on.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            rehabilitation_interval_minutes: default_rehab_interval(),
            idle_timeout_minutes: default_idle_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    500
}

fn default_rehab_interval() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    30
}
