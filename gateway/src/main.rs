#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gateway_lib::access::IpAccessController;
use gateway_lib::config::{load_from_path, Config, HotPoolConfig};
use gateway_lib::dispatch::{serve_quic, serve_rpc, Dispatcher};
use gateway_lib::fingerprint::{FingerprintLibrary, TlsClientFactory};
use gateway_lib::monitor::{DomainIpMonitor, NullGeoEnricher};
use gateway_lib::pool::HotConnectionPool;
use gateway_lib::telemetry::{init_metrics, init_tracing, shutdown_tracing, start_telemetry_server, Metrics};
use gateway_lib::{GatewayError, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browser-impersonating HTTPS fetch gateway")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", default_value = "config/gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_from_path(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&config.logging, &config.telemetry.otel_log_level) {
        eprintln!("failed to initialize tracing: {e}");
        std::process::exit(1);
    }

    let (metrics, registry) = match init_metrics() {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "failed to initialize metrics");
            std::process::exit(1);
        }
    };

    info!(hostnames = ?config.dns.hostnames, hot_pools = config.hot_pools.len(), "configuration loaded");

    if let Err(e) = run(config, metrics, registry).await {
        error!(error = %e, "gateway exited with error");
        shutdown_tracing();
        std::process::exit(1);
    }
    shutdown_tracing();
}

/// This process dispatches one fixed target domain for its lifetime: the
/// RPC/QUIC protocol carries only `client_id` and `path`, never a target
/// host, so a single `hot_pools` entry is required at startup.
fn select_hot_pool(config: &Config) -> Result<(String, HotPoolConfig)> {
    if config.hot_pools.len() > 1 {
        return Err(GatewayError::Config(
            "multiple hot_pools entries configured; one gateway process serves exactly one target domain".to_string(),
        ));
    }
    config
        .hot_pools
        .iter()
        .next()
        .map(|(domain, pool)| (domain.clone(), pool.clone()))
        .ok_or_else(|| GatewayError::Config("no hot_pools entry configured".to_string()))
}

async fn run(config: Config, metrics: Arc<Metrics>, registry: prometheus::Registry) -> Result<()> {
    let (domain, hot_pool_config) = select_hot_pool(&config)?;
    let target_config = config.target_for(&domain);

    let library = Arc::new(FingerprintLibrary::new());
    let tls_factory = Arc::new(TlsClientFactory::new());
    let access = Arc::new(IpAccessController::new());

    let servers = config.dns.resolve_servers();
    let monitor = Arc::new(DomainIpMonitor::new(
        config.dns.clone(),
        servers,
        Arc::new(NullGeoEnricher),
        metrics.clone(),
    ));
    monitor.start().await;

    let pool = Arc::new(HotConnectionPool::new(
        hot_pool_config,
        access.clone(),
        monitor.clone(),
        tls_factory.clone(),
        library.clone(),
        metrics.clone(),
    ));
    gateway_lib::pool::start(pool.clone()).await;

    let dispatcher = Arc::new(Dispatcher::new(
        pool.clone(),
        access.clone(),
        target_config,
        domain,
        library.clone(),
        config.pool.concurrency,
        config.server.temp_file_dir.clone(),
        metrics.clone(),
    ));

    let cancel = CancellationToken::new();
    let mut listeners = Vec::new();

    let rpc_addr: SocketAddr = ([0, 0, 0, 0], config.server.server_port).into();
    listeners.push(tokio::spawn(serve_rpc(rpc_addr, dispatcher.clone(), cancel.clone())));

    if config.server.quic_enabled {
        let (Some(cert), Some(key)) =
            (config.server.quic_cert_file.clone(), config.server.quic_key_file.clone())
        else {
            return Err(GatewayError::Config(
                "server.quic_enabled requires quic_cert_file and quic_key_file".to_string(),
            ));
        };
        let quic_addr: SocketAddr = ([0, 0, 0, 0], config.server.quic_port).into();
        let alpn = config.server.quic_alpn.clone();
        let idle_timeout = config.server.quic_max_idle_timeout_s;
        let dispatcher = dispatcher.clone();
        let cancel = cancel.clone();
        listeners.push(tokio::spawn(async move {
            serve_quic(quic_addr, &cert, &key, &alpn, idle_timeout, dispatcher, cancel).await
        }));
    }

    if let Some(metrics_port) = config.telemetry.metrics_port {
        let telemetry_addr: SocketAddr = ([0, 0, 0, 0], metrics_port).into();
        let pools = Arc::new(vec![pool.clone()]);
        let cancel = cancel.clone();
        listeners.push(tokio::spawn(start_telemetry_server(telemetry_addr, registry, pools, cancel)));
    }

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, draining listeners");
    cancel.cancel();
    pool.shutdown().await;
    monitor.stop().await;

    for listener in listeners {
        match listener.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "listener exited with error"),
            Err(e) => error!(error = %e, "listener task panicked"),
        }
    }

    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
