use serde::Deserialize;
use std::collections::HashMap;

use super::dns::DnsConfig;
use super::hot_pool::HotPoolConfig;
use super::logging::LoggingConfig;
use super::pool::PoolConfig;
use super::server::ServerConfig;
use super::target::TargetConfig;
use super::telemetry::TelemetryConfig;
use super::utls::UtlsConfig;

/// Top-level gateway configuration, as loaded from a TOML file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub dns: DnsConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub utls: UtlsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// One hot-pool configuration per target domain, keyed by domain name.
    pub hot_pools: HashMap<String, HotPoolConfig>,
    /// One request-shaping configuration per target domain, keyed by domain
    /// name. A domain with no entry here allows any path and applies no
    /// header overlay.
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

impl Config {
    pub fn target_for(&self, domain: &str) -> TargetConfig {
        self.targets.get(domain).cloned().unwrap_or_default()
    }
}
