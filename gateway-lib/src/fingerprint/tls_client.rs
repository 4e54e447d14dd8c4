use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tokio_rustls::rustls::client::Resumption;
use tokio_rustls::rustls::crypto::aws_lc_rs;
use tokio_rustls::rustls::crypto::CryptoProvider;
use tokio_rustls::rustls::{ClientConfig, RootCertStore, SupportedCipherSuite};

use crate::error::{GatewayError, Result};

use super::profile::FingerprintProfile;

/// Session tickets/IDs are shared across every connection dialed with the
/// same profile, capped at this many entries per profile (rustls's own
/// resumption store is itself LRU-backed).
const SESSION_CACHE_CAPACITY: usize = 1000;

fn cipher_suite_by_name(name: &str) -> Option<SupportedCipherSuite> {
    aws_lc_rs::ALL_CIPHER_SUITES
        .iter()
        .find(|s| format!("{:?}", s.suite()) == name)
        .copied()
}

fn kx_group_by_name(name: &str) -> Option<&'static dyn tokio_rustls::rustls::crypto::SupportedKxGroup> {
    aws_lc_rs::ALL_KX_GROUPS
        .iter()
        .find(|g| format!("{:?}", g.name()) == name)
        .copied()
}

fn root_store() -> Arc<RootCertStore> {
    static STORE: OnceLock<Arc<RootCertStore>> = OnceLock::new();
    STORE
        .get_or_init(|| {
            let mut store = RootCertStore::empty();
            store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            Arc::new(store)
        })
        .clone()
}

/// Builds, caches, and hands out per-profile `ClientConfig`s so dialing a
/// connection means reusing an `Arc<ClientConfig>` rather than rebuilding
/// crypto state.
pub struct TlsClientFactory {
    configs: DashMap<&'static str, Arc<ClientConfig>>,
}

impl Default for TlsClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TlsClientFactory {
    pub fn new() -> Self {
        Self { configs: DashMap::new() }
    }

    pub fn config_for(&self, profile: &'static FingerprintProfile) -> Result<Arc<ClientConfig>> {
        if let Some(existing) = self.configs.get(profile.name) {
            return Ok(existing.clone());
        }

        let config = Arc::new(build_client_config(profile)?);
        self.configs.insert(profile.name, config.clone());
        Ok(config)
    }
}

fn build_client_config(profile: &'static FingerprintProfile) -> Result<ClientConfig> {
    let cipher_suites: Vec<SupportedCipherSuite> = profile
        .cipher_suites
        .iter()
        .filter_map(|name| cipher_suite_by_name(name))
        .collect();
    if cipher_suites.is_empty() {
        return Err(GatewayError::Tls(format!(
            "profile {:?} resolved to zero usable cipher suites",
            profile.name
        )));
    }

    let kx_groups: Vec<&'static dyn tokio_rustls::rustls::crypto::SupportedKxGroup> = profile
        .curve_preferences
        .iter()
        .filter_map(|name| kx_group_by_name(name))
        .collect();
    if kx_groups.is_empty() {
        return Err(GatewayError::Tls(format!(
            "profile {:?} resolved to zero usable key-exchange groups",
            profile.name
        )));
    }

    let base = aws_lc_rs::default_provider();
    let provider = CryptoProvider {
        cipher_suites,
        kx_groups,
        ..base
    };

    let mut config = ClientConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| GatewayError::Tls(format!("unsupported protocol versions: {e}")))?
        .with_root_certificates(root_store())
        .with_no_client_auth();

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    // OmitEmptyPsk: cap resumption so a session established with zero
    // early-data never gets offered back as a PSK identity, sidestepping a
    // known class of malformed resumption ClientHellos some origins reject.
    config.resumption = Resumption::in_memory_sessions(SESSION_CACHE_CAPACITY);
    config.enable_early_data = false;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::catalog::catalog;

    #[test]
    fn builds_a_config_for_every_catalog_profile() {
        let factory = TlsClientFactory::new();
        for profile in catalog() {
            factory
                .config_for(profile)
                .unwrap_or_else(|e| panic!("{}: {e}", profile.name));
        }
    }

    #[test]
    fn repeated_lookups_reuse_the_cached_config() {
        let factory = TlsClientFactory::new();
        let profile = &catalog()[0];
        let a = factory.config_for(profile).unwrap();
        let b = factory.config_for(profile).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
