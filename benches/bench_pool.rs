//! Integration benchmarks for the hot connection pool.
//!
//! Measures real TLS dial+handshake latency against a loopback server, and
//! the in-memory acquire/return cycle that makes a warm pool cheap to use.
//! No mocks: the "cold" benchmark performs an actual TCP dial and rustls
//! handshake against a backend started in-process; only the outer DNS
//! monitor and access controller are the lightweight pieces the pool would
//! otherwise hold anyway.
//!
//! ```bash
//! cargo bench --bench bench_pool
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use gateway_lib::access::IpAccessController;
use gateway_lib::config::{DnsConfig, HotPoolConfig, StorageFormat};
use gateway_lib::fingerprint::{FingerprintLibrary, TlsClientFactory};
use gateway_lib::monitor::{DomainIpMonitor, NullGeoEnricher};
use gateway_lib::pool::HotConnectionPool;
use rcgen::CertifiedKey;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

/// Loopback TLS server that completes the handshake (negotiating h2, same
/// as a real warmup target) and then just drains bytes until the client
/// hangs up. The pool's `create()` never sends a request on its own, so
/// there is nothing to serve beyond the handshake.
struct TlsEchoServer {
    addr: SocketAddr,
    task: tokio::task::JoinHandle<()>,
}

impl TlsEchoServer {
    async fn start() -> Self {
        let CertifiedKey { cert, signing_key } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).expect("self-signed cert");
        let cert_der = CertificateDer::from(cert.der().to_vec());
        let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(signing_key.serialize_der()));

        let mut server_config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(vec![cert_der], key_der)
            .expect("valid server config");
        server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
        let acceptor = TlsAcceptor::from(Arc::new(server_config));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback listener");
        let addr = listener.local_addr().expect("local addr");

        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { break };
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    let Ok(mut tls) = acceptor.accept(stream).await else { return };
                    let mut buf = [0u8; 1024];
                    loop {
                        match tls.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(_) => {}
                        }
                    }
                });
            }
        });

        Self { addr, task }
    }
}

impl Drop for TlsEchoServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn hot_pool_config(domain: &str, port: u16) -> HotPoolConfig {
    HotPoolConfig {
        local_ipv4: None,
        local_ipv6_cidr: None,
        ipv6_queue_size: 100,
        target_domain: domain.to_string(),
        target_port: port,
        max_conns: 64,
        idle_timeout_minutes: 30,
        warmup_path: "/".to_string(),
        warmup_method: "GET".to_string(),
        warmup_concurrency: 4,
        warmup_expected_len: 13,
        blacklist_retest_interval_minutes: 5,
        ip_refresh_interval_minutes: 10,
        fingerprint_name: Some("chrome-124-windows".to_string()),
    }
}

async fn build_pool(domain: &str, port: u16, storage_dir: std::path::PathBuf) -> Arc<HotConnectionPool> {
    let monitor = Arc::new(DomainIpMonitor::new(
        DnsConfig {
            hostnames: vec![domain.to_string()],
            storage_dir,
            storage_format: StorageFormat::Json,
            update_interval_minutes: 60,
            dns_servers_file: None,
            query_timeout_secs: 1,
            max_workers: 1,
        },
        vec!["198.51.100.1".parse().unwrap()],
        Arc::new(NullGeoEnricher),
        gateway_lib::telemetry::init_metrics().unwrap().0,
    ));

    Arc::new(HotConnectionPool::new(
        hot_pool_config(domain, port),
        Arc::new(IpAccessController::new()),
        monitor,
        Arc::new(TlsClientFactory::new()),
        Arc::new(FingerprintLibrary::new()),
        gateway_lib::telemetry::init_metrics().unwrap().0,
    ))
}

/// Benchmark 1: cold dial + TLS handshake through `HotConnectionPool::create`.
/// This is the path a pool takes on a pool miss or during warmup.
fn bench_cold_create(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let server = rt.block_on(TlsEchoServer::start());
    let pool = rt.block_on(build_pool("localhost", server.addr.port(), dir.path().to_path_buf()));
    let target_ip = server.addr.ip();

    let mut group = c.benchmark_group("hot_pool_cold_create");
    group.sample_size(30);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("dial_and_tls_handshake", |b| {
        b.iter(|| {
            rt.block_on(async {
                let conn = pool.create(None, target_ip, true).await.expect("dial failed");
                // Dropping the connection tears down its driver task; each
                // iteration dials a fresh one, matching a genuine pool miss.
                drop(conn);
            })
        })
    });

    group.finish();
}

/// Benchmark 2: the warm acquire/return_conn cycle that keeps a hot pool
/// cheap — no network, just queue bookkeeping and classification.
fn bench_warm_acquire_return(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let server = rt.block_on(TlsEchoServer::start());
    let pool = rt.block_on(build_pool("localhost", server.addr.port(), dir.path().to_path_buf()));
    let target_ip = server.addr.ip();

    // Seed the healthy queue once; the bench loop only ever acquires and
    // immediately returns the same connection, so it never runs dry.
    rt.block_on(async {
        let conn = pool.create(None, target_ip, true).await.expect("seed dial failed");
        pool.return_conn(conn, 200).await;
    });

    let mut group = c.benchmark_group("hot_pool_warm_cycle");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("acquire_then_return", |b| {
        b.iter(|| {
            rt.block_on(async {
                let conn = pool.acquire().await.expect("acquire failed");
                pool.return_conn(conn, 200).await;
            })
        })
    });

    group.finish();
}

criterion_group!(pool_benches, bench_cold_create, bench_warm_acquire_return);
criterion_main!(pool_benches);
