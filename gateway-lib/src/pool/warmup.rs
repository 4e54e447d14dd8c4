use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::connection::{ConnectionMetadata, NegotiatedProtocol};
use super::hot_pool::HotConnectionPool;
use crate::fetch::ProtocolHandle;

/// Runs the initial warmup sweep over every known target IP (IPv6 first,
/// then IPv4), bounded by `warmup_concurrency` in flight at once. An h2
/// connection is considered warm the moment the handshake succeeds; h1
/// requires a real probe request matching the configured expectations.
/// Once the sweep completes, auto-warmup is enabled and any IPs that
/// appeared mid-sweep are drained and warmed in a second pass.
pub async fn run_initial_sweep(pool: &Arc<HotConnectionPool>) {
    let (ipv6, ipv4) = {
        let state = pool.state.read().await;
        (state.target_ipv6.clone(), state.target_ipv4.clone())
    };
    let candidates: Vec<IpAddr> = ipv6.into_iter().chain(ipv4).collect();
    info!(count = candidates.len(), domain = %pool.config.target_domain, "starting warmup sweep");
    warmup_many(pool, candidates).await;

    let mut state = pool.state.write().await;
    state.auto_warmup_enabled = true;
    let pending = state.take_pending_warmups();
    drop(state);

    if !pending.is_empty() {
        info!(count = pending.len(), "warming ips that appeared during the initial sweep");
        warmup_many(pool, pending).await;
    }
}

/// `is_retest` distinguishes a blacklist-rehabilitation probe from an
/// ordinary warmup, so a success is attributed to the right metric.
pub async fn warmup_many(pool: &Arc<HotConnectionPool>, ips: Vec<IpAddr>) {
    warmup_many_inner(pool, ips, false).await;
}

pub(crate) async fn warmup_many_inner(pool: &Arc<HotConnectionPool>, ips: Vec<IpAddr>, is_retest: bool) {
    let semaphore = Arc::new(Semaphore::new(pool.config.warmup_concurrency.max(1)));
    let mut handles = Vec::with_capacity(ips.len());
    for ip in ips {
        let pool = pool.clone();
        let semaphore = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("warmup semaphore closed");
            warmup_one(&pool, ip, is_retest).await;
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }
}

async fn warmup_one(pool: &Arc<HotConnectionPool>, ip: IpAddr, is_retest: bool) {
    let local_ip = pool.egress_ip().await;
    let conn = match pool.create(local_ip, ip, true).await {
        Ok(conn) => conn,
        Err(e) => {
            debug!(%ip, error = %e, "warmup dial failed");
            pool.state.write().await.record_failure(ip);
            pool.metrics.warmup_failure_total.add(1, &[]);
            return;
        }
    };

    match conn.negotiated_protocol {
        NegotiatedProtocol::Http2 => {
            debug!(%ip, "h2 warmup: handshake alone counts as warm");
            pool.access.mark_success(&ip.to_string()).await;
            pool.state.write().await.record_success(ip);
            record_warmup_success(pool, is_retest);
            if pool.healthy_sender().try_send(conn).is_err() {
                warn!(%ip, "healthy queue full during warmup, dropping connection");
            }
        }
        NegotiatedProtocol::Http1 => warmup_h1(pool, conn, is_retest).await,
    }
}

fn record_warmup_success(pool: &Arc<HotConnectionPool>, is_retest: bool) {
    if is_retest {
        pool.metrics.rehabilitation_transitions_total.add(1, &[]);
    } else {
        pool.metrics.warmup_success_total.add(1, &[]);
    }
}

async fn warmup_h1(pool: &Arc<HotConnectionPool>, mut conn: ConnectionMetadata, is_retest: bool) {
    let ip = conn.target_ip;
    let request = match build_warmup_request(pool) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "failed to build warmup request");
            return;
        }
    };

    let ProtocolHandle::Http1(send_request) = &mut conn.handle else {
        unreachable!("warmup_h1 called with a non-h1 handle");
    };

    let outcome = send_request.send_request(request).await;
    match outcome {
        Ok(response) => {
            let status = response.status().as_u16();
            let body = match http_body_util::BodyExt::collect(response.into_body()).await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    debug!(%ip, error = %e, "warmup body read failed");
                    pool.state.write().await.record_failure(ip);
                    pool.metrics.warmup_failure_total.add(1, &[]);
                    return;
                }
            };

            if status == 200 && body.len() == pool.config.warmup_expected_len {
                pool.access.mark_success(&ip.to_string()).await;
                pool.state.write().await.record_success(ip);
                record_warmup_success(pool, is_retest);
                conn.touch();
                if pool.healthy_sender().try_send(conn).is_err() {
                    warn!(%ip, "healthy queue full during warmup, dropping connection");
                }
            } else if status == 403 {
                pool.access.mark_failure(&ip.to_string()).await;
                pool.state.write().await.record_failure(ip);
                pool.metrics.warmup_failure_total.add(1, &[]);
                pool.metrics.blacklist_transitions_total.add(1, &[]);
            } else {
                debug!(%ip, status, len = body.len(), "warmup probe did not match expectations");
                pool.state.write().await.record_failure(ip);
                pool.metrics.warmup_failure_total.add(1, &[]);
                if pool.unhealthy_sender().try_send(conn).is_err() {
                    debug!(%ip, "unhealthy queue full during warmup, dropping connection");
                }
            }
        }
        Err(e) => {
            debug!(%ip, error = %e, "warmup probe request failed");
            pool.state.write().await.record_failure(ip);
            pool.metrics.warmup_failure_total.add(1, &[]);
        }
    }
}

fn build_warmup_request(pool: &Arc<HotConnectionPool>) -> crate::error::Result<hyper::Request<Full<Bytes>>> {
    let profile = pool.library.random_profile();
    hyper::Request::builder()
        .method(pool.config.warmup_method.as_str())
        .uri(pool.config.warmup_path.as_str())
        .header(hyper::header::HOST, pool.config.target_domain.clone())
        .header(hyper::header::USER_AGENT, profile.user_agent)
        .header(hyper::header::ACCEPT_LANGUAGE, crate::fingerprint::random_accept_language())
        .body(Full::new(Bytes::new()))
        .map_err(|e| crate::error::GatewayError::Tls(format!("failed to build warmup request: {e}")))
}
