use std::path::Path;

use tracing::info;

use crate::error::{GatewayError, Result};

use super::root::Config;

/// Reads and parses a TOML configuration file, then validates it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        GatewayError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let config: Config = toml::from_str(&raw)?;
    validate_config(&config)?;
    info!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Cross-field validation that serde's per-field defaults cannot express.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.dns.hostnames.is_empty() {
        return Err(GatewayError::Config(
            "dns.hostnames must list at least one hostname".to_string(),
        ));
    }

    if config.hot_pools.is_empty() {
        return Err(GatewayError::Config(
            "at least one entry under hot_pools is required".to_string(),
        ));
    }

    for (domain, pool) in &config.hot_pools {
        if pool.local_ipv4.is_some() && pool.local_ipv6_cidr.is_some() {
            return Err(GatewayError::Config(format!(
                "hot_pools.{domain}: local_ipv4 and local_ipv6_cidr are mutually exclusive"
            )));
        }
        if pool.max_conns == 0 {
            return Err(GatewayError::Config(format!(
                "hot_pools.{domain}: max_conns must be greater than zero"
            )));
        }
        if let Some(cidr) = &pool.local_ipv6_cidr {
            cidr.parse::<ipnet::Ipv6Net>().map_err(|e| {
                GatewayError::Config(format!(
                    "hot_pools.{domain}: invalid local_ipv6_cidr {cidr:?}: {e}"
                ))
            })?;
        }
        if !config.dns.hostnames.iter().any(|h| h == &pool.target_domain) {
            return Err(GatewayError::Config(format!(
                "hot_pools.{domain}: target_domain {:?} is not listed in dns.hostnames",
                pool.target_domain
            )));
        }
    }

    if config.server.quic_enabled
        && (config.server.quic_cert_file.is_none() || config.server.quic_key_file.is_none())
    {
        return Err(GatewayError::Config(
            "server.quic_enabled requires quic_cert_file and quic_key_file".to_string(),
        ));
    }

    Ok(())
}
