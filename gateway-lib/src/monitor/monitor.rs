use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::DnsConfig;
use crate::telemetry::Metrics;

use super::geo::GeoEnricher;
use super::persistence;
use super::resolver::resolve_across_servers;
use super::types::{DomainPool, TargetIpRecord};

/// Keeps a fresh, monotonically-accumulating IP pool per monitored domain,
/// backed by periodic DNS refreshes and a per-domain on-disk cache.
pub struct DomainIpMonitor {
    config: DnsConfig,
    servers: Vec<IpAddr>,
    geo: Arc<dyn GeoEnricher>,
    pools: Arc<RwLock<HashMap<String, DomainPool>>>,
    cancel: CancellationToken,
    task: RwLock<Option<tokio::task::JoinHandle<()>>>,
    metrics: Arc<Metrics>,
}

impl DomainIpMonitor {
    pub fn new(config: DnsConfig, servers: Vec<IpAddr>, geo: Arc<dyn GeoEnricher>, metrics: Arc<Metrics>) -> Self {
        Self {
            config,
            servers,
            geo,
            pools: Arc::new(RwLock::new(HashMap::new())),
            cancel: CancellationToken::new(),
            task: RwLock::new(None),
            metrics,
        }
    }

    /// Runs one immediate refresh, then schedules further refreshes on
    /// `update_interval`. Warns (but does not refuse to start) if the
    /// configured interval is under one minute.
    pub async fn start(self: &Arc<Self>) {
        if self.config.update_interval_minutes < 1 {
            warn!(
                minutes = self.config.update_interval_minutes,
                "dns update_interval_minutes below 1 minute"
            );
        }

        self.refresh_all().await;

        let this = self.clone();
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.config.update_interval());
            ticker.tick().await; // first tick fires immediately; already refreshed above
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => this.refresh_all().await,
                }
            }
        });

        *self.task.write().await = Some(handle);
    }

    pub async fn stop(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.task.write().await.take() {
            let _ = handle.await;
        }
    }

    pub async fn get_domain_pool(&self, domain: &str) -> Option<DomainPool> {
        self.pools.read().await.get(domain).cloned()
    }

    async fn refresh_all(&self) {
        let domains = self.config.hostnames.clone();
        let refreshes = domains.into_iter().map(|domain| self.refresh_domain(domain));
        futures::future::join_all(refreshes).await;
    }

    async fn refresh_domain(&self, domain: String) {
        let started = Instant::now();
        let mut pool = persistence::load(&self.config.storage_dir, &domain, self.config.storage_format)
            .await
            .unwrap_or_else(|e| {
                warn!(domain = %domain, error = %e, "failed to load persisted dns records, starting empty");
                DomainPool::default()
            });

        let resolved = resolve_across_servers(
            &domain,
            &self.servers,
            self.config.max_workers,
            self.config.query_timeout(),
        )
        .await;

        let mut new_ips: Vec<IpAddr> = Vec::new();
        for ip in resolved.ipv4.into_iter().map(IpAddr::V4) {
            if !pool.contains(&ip) {
                new_ips.push(ip);
            }
        }
        for ip in resolved.ipv6.into_iter().map(IpAddr::V6) {
            if !pool.contains(&ip) {
                new_ips.push(ip);
            }
        }

        self.metrics.monitor_new_ips_total.add(new_ips.len() as u64, &[]);
        for ip in new_ips {
            let metadata = self.geo.lookup(ip).await;
            let mut record = TargetIpRecord::new(ip);
            record.metadata = metadata;
            pool.insert(record);
        }

        {
            let mut pools = self.pools.write().await;
            pools.insert(domain.clone(), pool.clone());
        }

        if let Err(e) =
            persistence::persist(&self.config.storage_dir, &domain, self.config.storage_format, &pool)
                .await
        {
            warn!(domain = %domain, error = %e, "failed to persist dns records");
        }

        self.metrics.monitor_refresh_duration_seconds.record(started.elapsed().as_secs_f64(), &[]);
        info!(domain = %domain, ipv4 = pool.ipv4.len(), ipv6 = pool.ipv6.len(), "dns refresh complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageFormat;
    use crate::monitor::geo::NullGeoEnricher;

    fn test_config(storage_dir: std::path::PathBuf) -> DnsConfig {
        DnsConfig {
            hostnames: vec!["example.invalid".to_string()],
            storage_dir,
            storage_format: StorageFormat::Json,
            update_interval_minutes: 10,
            dns_servers_file: None,
            query_timeout_secs: 1,
            max_workers: 2,
        }
    }

    #[tokio::test]
    async fn get_domain_pool_is_none_before_first_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = Arc::new(DomainIpMonitor::new(
            test_config(dir.path().to_path_buf()),
            vec!["198.51.100.1".parse().unwrap()],
            Arc::new(NullGeoEnricher),
            crate::telemetry::init_metrics().unwrap().0,
        ));
        assert!(monitor.get_domain_pool("example.invalid").await.is_none());
    }

    #[tokio::test]
    async fn refresh_populates_and_persists_pool() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = Arc::new(DomainIpMonitor::new(
            test_config(dir.path().to_path_buf()),
            vec!["198.51.100.1".parse().unwrap()],
            Arc::new(NullGeoEnricher),
            crate::telemetry::init_metrics().unwrap().0,
        ));
        monitor.refresh_all().await;
        // unreachable test server resolves nothing, but the pool entry
        // should exist (possibly empty) and be persisted.
        assert!(monitor.get_domain_pool("example.invalid").await.is_some());
    }
}
