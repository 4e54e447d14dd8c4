use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gateway_lib::access::IpAccessController;
use gateway_lib::config::{DnsConfig, HotPoolConfig, StorageFormat, TargetConfig};
use gateway_lib::dispatch::{Dispatcher, TaskRequest};
use gateway_lib::fingerprint::{FingerprintLibrary, TlsClientFactory};
use gateway_lib::monitor::{DomainIpMonitor, NullGeoEnricher};
use gateway_lib::pool::HotConnectionPool;

fn tmp_dir(name: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("gateway-dispatcher-{nanos}-{name}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn hot_pool_config() -> HotPoolConfig {
    HotPoolConfig {
        local_ipv4: None,
        local_ipv6_cidr: None,
        ipv6_queue_size: 100,
        target_domain: "example.com".to_string(),
        target_port: 443,
        max_conns: 10,
        idle_timeout_minutes: 30,
        warmup_path: "/".to_string(),
        warmup_method: "GET".to_string(),
        warmup_concurrency: 1,
        warmup_expected_len: 0,
        blacklist_retest_interval_minutes: 5,
        ip_refresh_interval_minutes: 10,
        fingerprint_name: Some("chrome-124-windows".to_string()),
    }
}

fn build_dispatcher(target_config: TargetConfig) -> Dispatcher {
    let metrics = gateway_lib::telemetry::init_metrics().unwrap().0;
    let access = Arc::new(IpAccessController::new());
    let monitor = Arc::new(DomainIpMonitor::new(
        DnsConfig {
            hostnames: vec!["example.com".to_string()],
            storage_dir: tmp_dir("dns"),
            storage_format: StorageFormat::Json,
            update_interval_minutes: 60,
            dns_servers_file: None,
            query_timeout_secs: 1,
            max_workers: 1,
        },
        vec!["198.51.100.1".parse().unwrap()],
        Arc::new(NullGeoEnricher),
        metrics.clone(),
    ));

    let pool = Arc::new(HotConnectionPool::new(
        hot_pool_config(),
        access.clone(),
        monitor,
        Arc::new(TlsClientFactory::new()),
        Arc::new(FingerprintLibrary::new()),
        metrics.clone(),
    ));

    Dispatcher::new(
        pool,
        access,
        target_config,
        "example.com".to_string(),
        Arc::new(FingerprintLibrary::new()),
        4,
        tmp_dir("bodies"),
        metrics,
    )
}

#[tokio::test]
async fn rejects_path_not_in_target_allowlist() {
    let target = TargetConfig { paths: vec!["/allowed".to_string()], headers: HashMap::new() };
    let dispatcher = build_dispatcher(target);

    let resp = dispatcher
        .execute(TaskRequest { client_id: "client-1".to_string(), path: "/forbidden".to_string() })
        .await;

    assert_eq!(resp.status_code, 0);
    assert_eq!(resp.error_message, "path not allowed for this target");
}

#[tokio::test]
async fn rejects_empty_path() {
    let dispatcher = build_dispatcher(TargetConfig::default());

    let resp =
        dispatcher.execute(TaskRequest { client_id: "client-1".to_string(), path: String::new() }).await;

    assert_eq!(resp.status_code, 0);
    assert_eq!(resp.error_message, "path required");
}

#[tokio::test]
async fn fails_with_whitelist_empty_when_no_ip_has_been_admitted() {
    // An empty target allowlist accepts any path, so this request clears the
    // path check and reaches the dispatch loop, where the access controller
    // has never whitelisted an IP.
    let dispatcher = build_dispatcher(TargetConfig::default());

    let resp = dispatcher
        .execute(TaskRequest { client_id: "client-1".to_string(), path: "/anything".to_string() })
        .await;

    assert_eq!(resp.status_code, 0);
    assert_eq!(resp.error_message, "whitelist empty");
}
