use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use prometheus::Registry;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::Result;
use crate::pool::HotConnectionPool;

use super::{handle_metrics, health_check_response, live_check_response, ready_check_response};

fn internal_error() -> hyper::Response<http_body_util::combinators::BoxBody<Bytes, hyper::Error>> {
    let body = Full::new(Bytes::from("internal server error")).map_err(|never| match never {}).boxed();
    let mut resp = hyper::Response::new(body);
    *resp.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
    resp
}

fn not_found() -> hyper::Response<http_body_util::combinators::BoxBody<Bytes, hyper::Error>> {
    let body = Full::new(Bytes::from("not found")).map_err(|never| match never {}).boxed();
    let mut resp = hyper::Response::new(body);
    *resp.status_mut() = hyper::StatusCode::NOT_FOUND;
    resp
}

/// Serves `/metrics` (Prometheus exposition) and `/health`, `/ready`,
/// `/live` on a dedicated port, separate from the RPC/QUIC listeners.
pub async fn start(
    addr: SocketAddr,
    registry: Registry,
    pools: Arc<Vec<Arc<HotConnectionPool>>>,
    cancel: CancellationToken,
) -> Result<()> {
    let registry = Arc::new(registry);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "telemetry server started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("telemetry server shutting down");
                return Ok(());
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "telemetry server accept error");
                        continue;
                    }
                };

                let registry = registry.clone();
                let pools = pools.clone();
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let registry = registry.clone();
                        let pools = pools.clone();
                        async move {
                            let response = match req.uri().path() {
                                "/health" => health_check_response().unwrap_or_else(|_| internal_error()),
                                "/ready" => ready_check_response(&pools).await.unwrap_or_else(|_| internal_error()),
                                "/live" => live_check_response().unwrap_or_else(|_| internal_error()),
                                "/metrics" => handle_metrics(&registry).unwrap_or_else(|_| internal_error()),
                                _ => not_found(),
                            };
                            Ok::<_, hyper::Error>(response)
                        }
                    });

                    let builder = ConnBuilder::new(TokioExecutor::new());
                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(%peer, error = %e, "telemetry server connection error");
                    }
                });
            }
        }
    }
}
