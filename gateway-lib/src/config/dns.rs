use serde::Deserialize;
use std::path::PathBuf;

/// Domain IP monitor configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct DnsConfig {
    /// Hostnames to monitor and keep a fresh IP pool for.
    pub hostnames: Vec<String>,
    /// Directory holding one persisted record file per monitored domain.
    pub storage_dir: PathBuf,
    /// On-disk serialization format for persisted domain records.
    #[serde(default)]
    pub storage_format: StorageFormat,
    /// How often to re-resolve all monitored hostnames, in minutes.
    #[serde(default = "default_update_interval")]
    pub update_interval_minutes: u64,
    /// Path to a JSON file listing DNS servers to query; falls back to
    /// `default_dns_servers()` when the file is absent.
    #[serde(default)]
    pub dns_servers_file: Option<PathBuf>,
    /// Per-server, per-record-type query timeout, in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
    /// Maximum number of concurrent DNS-server workers per refresh.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl DnsConfig {
    pub fn update_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.update_interval_minutes.max(1) * 60)
    }

    pub fn query_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.query_timeout_secs)
    }

    /// Reads `dns_servers_file` as a JSON array of IP strings, falling back
    /// to `default_dns_servers()` if it is unset, unreadable, or parses to
    /// nothing usable.
    pub fn resolve_servers(&self) -> Vec<std::net::IpAddr> {
        let Some(path) = &self.dns_servers_file else {
            return default_dns_servers();
        };
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return default_dns_servers(),
        };
        let entries: Vec<String> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(_) => return default_dns_servers(),
        };
        let parsed: Vec<std::net::IpAddr> = entries.iter().filter_map(|s| s.parse().ok()).collect();
        if parsed.is_empty() {
            default_dns_servers()
        } else {
            parsed
        }
    }
}

/// On-disk serialization format for a domain's persisted IP records.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

impl StorageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            StorageFormat::Json => "json",
            StorageFormat::Yaml => "yaml",
            StorageFormat::Toml => "toml",
        }
    }
}

fn default_update_interval() -> u64 {
    10
}

fn default_query_timeout() -> u64 {
    5
}

fn default_max_workers() -> usize {
    50
}

/// Public DNS resolvers consulted when no `dns_servers_file` is configured
/// or it cannot be read.
pub fn default_dns_servers() -> Vec<std::net::IpAddr> {
    [
        "8.8.8.8", "8.8.4.4", // Google
        "1.1.1.1", "1.0.0.1", // Cloudflare
        "9.9.9.9", "149.112.112.112", // Quad9
        "208.67.222.222", "208.67.220.220", // OpenDNS
    ]
    .iter()
    .filter_map(|s| s.parse().ok())
    .collect()
}
