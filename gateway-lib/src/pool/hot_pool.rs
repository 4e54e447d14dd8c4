use std::net::IpAddr;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::access::IpAccessController;
use crate::config::HotPoolConfig;
use crate::egress::LocalEgressPool;
use crate::error::{GatewayError, Result};
use crate::fetch;
use crate::fingerprint::{FingerprintLibrary, TlsClientFactory};
use crate::monitor::DomainIpMonitor;
use crate::telemetry::Metrics;

use super::connection::ConnectionMetadata;
use super::state::PoolState;

/// Dominant component: owns bounded healthy/unhealthy connection queues for
/// one target domain plus the ancillary IP bookkeeping and background
/// schedulers that keep it warm.
pub struct HotConnectionPool {
    pub(crate) config: HotPoolConfig,
    pub(crate) access: Arc<IpAccessController>,
    pub(crate) monitor: Arc<DomainIpMonitor>,
    pub(crate) tls_factory: Arc<TlsClientFactory>,
    pub(crate) library: Arc<FingerprintLibrary>,
    pub(crate) metrics: Arc<Metrics>,
    egress: Mutex<LocalEgressPool>,

    healthy_tx: mpsc::Sender<ConnectionMetadata>,
    healthy_rx: Mutex<mpsc::Receiver<ConnectionMetadata>>,
    unhealthy_tx: mpsc::Sender<ConnectionMetadata>,
    unhealthy_rx: Mutex<mpsc::Receiver<ConnectionMetadata>>,

    pub(crate) state: RwLock<PoolState>,
    pub(crate) cancel: CancellationToken,
}

impl HotConnectionPool {
    pub fn new(
        config: HotPoolConfig,
        access: Arc<IpAccessController>,
        monitor: Arc<DomainIpMonitor>,
        tls_factory: Arc<TlsClientFactory>,
        library: Arc<FingerprintLibrary>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let capacity = config.max_conns.max(1);
        let (healthy_tx, healthy_rx) = mpsc::channel(capacity);
        let (unhealthy_tx, unhealthy_rx) = mpsc::channel(capacity);
        let egress = LocalEgressPool::new(
            config.local_ipv4.into_iter().collect(),
            config.local_ipv6_cidr.clone(),
            config.ipv6_queue_size,
        );
        Self {
            config,
            access,
            monitor,
            tls_factory,
            library,
            metrics,
            egress: Mutex::new(egress),
            healthy_tx,
            healthy_rx: Mutex::new(healthy_rx),
            unhealthy_tx,
            unhealthy_rx: Mutex::new(unhealthy_rx),
            state: RwLock::new(PoolState::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Dials and handshakes a new connection to `target_ip`.
    pub async fn create(
        &self,
        local_ip: Option<IpAddr>,
        target_ip: IpAddr,
        skip_whitelist_check: bool,
    ) -> Result<ConnectionMetadata> {
        if !skip_whitelist_check {
            let empty = self.access.whitelist_is_empty().await;
            if !empty && !self.access.is_allowed(&target_ip.to_string()).await {
                return Err(GatewayError::NotAllowed(target_ip.to_string()));
            }
        }

        let profile = match &self.config.fingerprint_name {
            Some(name) => self
                .library
                .by_name(name)
                .ok_or_else(|| GatewayError::Config(format!("unknown fingerprint_name {name:?}")))?,
            None => self.library.random_profile(),
        };

        let established = fetch::establish(
            &self.config.target_domain,
            target_ip,
            self.config.target_port,
            local_ip,
            true,
            profile,
            &self.tls_factory,
            std::time::Duration::from_secs(10),
        )
        .await?;

        Ok(ConnectionMetadata::new(target_ip, established.local_ip, established.handle))
    }

    /// Pops a usable connection: healthy queue first, then unhealthy, then
    /// falls back to creating a fresh one against a randomly permuted
    /// whitelist-filtered candidate list.
    pub async fn acquire(&self) -> Result<ConnectionMetadata> {
        while let Ok(conn) = self.healthy_rx.lock().await.try_recv() {
            if conn.is_usable() {
                self.metrics.pool_hits_total.add(1, &[]);
                return Ok(conn);
            }
            debug!(ip = %conn.target_ip, "discarding stale healthy connection");
        }

        while let Ok(conn) = self.unhealthy_rx.lock().await.try_recv() {
            if conn.is_usable() {
                self.metrics.pool_hits_total.add(1, &[]);
                return Ok(conn);
            }
            debug!(ip = %conn.target_ip, "discarding stale unhealthy connection");
        }

        self.metrics.pool_misses_total.add(1, &[]);
        self.create_via_fallback().await
    }

    /// Next local egress address to bind an outbound dial to, per this
    /// pool's configured egress mode.
    pub(crate) async fn egress_ip(&self) -> Option<IpAddr> {
        self.egress.lock().await.get_ip().await.and_then(Option::<IpAddr>::from)
    }

    /// Acquires a connection to a specific `target_ip`, honoring the
    /// dispatcher's round-robin choice instead of picking whatever is
    /// sitting at the front of either queue. Checks both queues for an
    /// already-warm match first, re-parking everything else it drained
    /// along the way, then dials fresh against `target_ip` on a miss.
    pub async fn acquire_for(&self, target_ip: IpAddr) -> Result<ConnectionMetadata> {
        if let Some(conn) = Self::take_matching(&self.healthy_rx, &self.healthy_tx, target_ip).await {
            self.metrics.pool_hits_total.add(1, &[]);
            return Ok(conn);
        }
        if let Some(conn) = Self::take_matching(&self.unhealthy_rx, &self.unhealthy_tx, target_ip).await {
            self.metrics.pool_hits_total.add(1, &[]);
            return Ok(conn);
        }

        self.metrics.pool_misses_total.add(1, &[]);
        let local_ip = self.egress_ip().await;
        self.create(local_ip, target_ip, false).await
    }

    /// Drains `rx` looking for a usable connection to `target_ip`, discarding
    /// stale entries and re-parking everything else back through `tx`.
    async fn take_matching(
        rx: &Mutex<mpsc::Receiver<ConnectionMetadata>>,
        tx: &mpsc::Sender<ConnectionMetadata>,
        target_ip: IpAddr,
    ) -> Option<ConnectionMetadata> {
        let mut rx = rx.lock().await;
        let mut drained = Vec::new();
        while let Ok(conn) = rx.try_recv() {
            drained.push(conn);
        }

        let mut found = None;
        for conn in drained {
            if found.is_none() && conn.is_usable() && conn.target_ip == target_ip {
                found = Some(conn);
                continue;
            }
            if conn.is_usable() {
                let _ = tx.try_send(conn);
            }
        }
        found
    }

    async fn create_via_fallback(&self) -> Result<ConnectionMetadata> {
        let (ipv4, ipv6, whitelist_empty) = {
            let state = self.state.read().await;
            (state.target_ipv4.clone(), state.target_ipv6.clone(), self.access.whitelist_is_empty().await)
        };

        let mut candidates: Vec<IpAddr> = ipv6.into_iter().chain(ipv4).collect();
        if !whitelist_empty {
            let mut filtered = Vec::with_capacity(candidates.len());
            for ip in candidates {
                if self.access.is_allowed(&ip.to_string()).await {
                    filtered.push(ip);
                }
            }
            candidates = filtered;
        }

        if candidates.is_empty() {
            return Err(GatewayError::WhitelistEmpty);
        }

        let mut rng = rand::rng();
        candidates.shuffle(&mut rng);

        let mut last_err = GatewayError::WhitelistEmpty;
        for ip in candidates {
            let local_ip = self.egress_ip().await;
            match self.create(local_ip, ip, false).await {
                Ok(conn) => return Ok(conn),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    /// Classifies and parks (or closes) a connection returning from use.
    pub async fn return_conn(&self, conn: ConnectionMetadata, status_code: u16) {
        let ip = conn.target_ip;

        match status_code {
            200 => {
                self.access.mark_success(&ip.to_string()).await;
                self.state.write().await.record_success(ip);
                self.park(conn, true).await;
            }
            403 => {
                self.access.mark_failure(&ip.to_string()).await;
                self.state.write().await.record_failure(ip);
                self.metrics.blacklist_transitions_total.add(1, &[]);
                // closed, not parked
            }
            0 => {
                self.state.write().await.record_failure(ip);
                // closed, not parked
            }
            _ => {
                self.state.write().await.record_failure(ip);
                self.park(conn, false).await;
            }
        }
    }

    async fn park(&self, mut conn: ConnectionMetadata, healthy: bool) {
        conn.touch();
        let primary = if healthy { &self.healthy_tx } else { &self.unhealthy_tx };
        if let Err(mpsc::error::TrySendError::Full(conn)) = primary.try_send(conn) {
            if healthy {
                if let Err(mpsc::error::TrySendError::Full(_)) = self.unhealthy_tx.try_send(conn) {
                    warn!(ip = %self.config.target_domain, "both pool queues full, closing connection");
                }
            } else {
                warn!(ip = %self.config.target_domain, "unhealthy queue full, closing connection");
            }
        }
    }

    pub(crate) fn healthy_sender(&self) -> mpsc::Sender<ConnectionMetadata> {
        self.healthy_tx.clone()
    }

    pub(crate) fn unhealthy_sender(&self) -> mpsc::Sender<ConnectionMetadata> {
        self.unhealthy_tx.clone()
    }

    /// Number of distinct target IPs ever seen for this pool's domain.
    /// Used by the readiness probe: a pool with zero known IPs has nothing
    /// to dispatch to yet.
    pub async fn known_ip_count(&self) -> usize {
        self.state.read().await.known_ips.len()
    }

    /// Drains both queues and re-enqueues only connections that are still
    /// usable. Queues are briefly empty mid-purge; a concurrent `acquire`
    /// simply falls through to dialing a fresh connection, which is
    /// harmless. Returns the number of connections dropped.
    pub(crate) async fn purge_dead_connections(&self) -> u64 {
        let mut purged = 0u64;

        let mut healthy_rx = self.healthy_rx.lock().await;
        let mut survivors = Vec::new();
        while let Ok(conn) = healthy_rx.try_recv() {
            if conn.is_usable() {
                survivors.push(conn);
            } else {
                purged += 1;
            }
        }
        for conn in survivors {
            let _ = self.healthy_tx.try_send(conn);
        }
        drop(healthy_rx);

        let mut unhealthy_rx = self.unhealthy_rx.lock().await;
        let mut survivors = Vec::new();
        while let Ok(conn) = unhealthy_rx.try_recv() {
            if conn.is_usable() {
                survivors.push(conn);
            } else {
                purged += 1;
            }
        }
        for conn in survivors {
            let _ = self.unhealthy_tx.try_send(conn);
        }

        purged
    }

    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let mut healthy = self.healthy_rx.lock().await;
        while healthy.try_recv().is_ok() {}
        let mut unhealthy = self.unhealthy_rx.lock().await;
        while unhealthy.try_recv().is_ok() {}
        info!(domain = %self.config.target_domain, "hot pool shut down");
    }
}

/// Connectivity-error sentinel used by callers of `do_request` to signal
/// "this wasn't even an HTTP response" to `return_conn`.
pub const STATUS_CONNECTIVITY_ERROR: u16 = 0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DnsConfig, HotPoolConfig, StorageFormat};
    use crate::fingerprint::FingerprintLibrary;
    use crate::monitor::{DomainIpMonitor, NullGeoEnricher};

    fn test_config(domain: &str) -> HotPoolConfig {
        HotPoolConfig {
            local_ipv4: None,
            local_ipv6_cidr: None,
            ipv6_queue_size: 100,
            target_domain: domain.to_string(),
            target_port: 443,
            max_conns: 4,
            idle_timeout_minutes: 30,
            warmup_path: "/".to_string(),
            warmup_method: "GET".to_string(),
            warmup_concurrency: 2,
            warmup_expected_len: 13,
            blacklist_retest_interval_minutes: 5,
            ip_refresh_interval_minutes: 10,
            fingerprint_name: None,
        }
    }

    fn test_pool(domain: &str) -> HotConnectionPool {
        let dir = tempfile::tempdir().unwrap();
        let monitor = Arc::new(DomainIpMonitor::new(
            DnsConfig {
                hostnames: vec![domain.to_string()],
                storage_dir: dir.path().to_path_buf(),
                storage_format: StorageFormat::Json,
                update_interval_minutes: 10,
                dns_servers_file: None,
                query_timeout_secs: 1,
                max_workers: 2,
            },
            vec!["198.51.100.1".parse().unwrap()],
            Arc::new(NullGeoEnricher),
            crate::telemetry::init_metrics().unwrap().0,
        ));
        HotConnectionPool::new(
            test_config(domain),
            Arc::new(IpAccessController::new()),
            monitor,
            Arc::new(TlsClientFactory::new()),
            Arc::new(FingerprintLibrary::new()),
            crate::telemetry::init_metrics().unwrap().0,
        )
    }

    #[tokio::test]
    async fn acquire_with_no_known_ips_fails_fast_without_dialing() {
        let pool = test_pool("example.invalid");
        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, GatewayError::WhitelistEmpty));
    }

    #[tokio::test]
    async fn purge_on_empty_queues_is_a_no_op() {
        let pool = test_pool("example.invalid");
        assert_eq!(pool.purge_dead_connections().await, 0);
    }
}
