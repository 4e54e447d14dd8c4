use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::{http1, http2};
use hyper_util::rt::{TokioExecutor, TokioIo};
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::{rustls::ClientConfig, TlsConnector};
use tracing::{debug, warn};

use crate::error::{GatewayError, Result};
use crate::fingerprint::{FingerprintLibrary, FingerprintProfile, TlsClientFactory};

use super::request::{FetchRequest, FetchResponse};
use super::retry::is_retryable;

/// Negotiated protocol handle for an established connection. Held by the
/// hot pool across multiple requests; the h1 handle is only valid for a
/// single in-flight request at a time.
pub enum ProtocolHandle {
    Http1(http1::SendRequest<Full<Bytes>>),
    Http2(http2::SendRequest<Full<Bytes>>),
}

pub struct Established {
    pub handle: ProtocolHandle,
    pub local_ip: Option<IpAddr>,
}

/// Binds and connects through `tokio::net::TcpSocket`, which (unlike
/// `socket2::Socket`) exposes an async `connect` without needing a manual
/// std-to-tokio handoff.
mod connect_ext {
    use super::*;
    use tokio::net::TcpSocket;

    pub async fn connect(domain_is_v6: bool, local_ip: Option<IpAddr>, target: SocketAddr, timeout: Duration) -> Result<TcpStream> {
        let socket = if domain_is_v6 { TcpSocket::new_v6()? } else { TcpSocket::new_v4()? };
        if let Some(ip) = local_ip {
            let bind_addr: SocketAddr = (ip, 0).into();
            if let Err(e) = socket.bind(bind_addr) {
                warn!(%ip, error = %e, "failed to bind egress address, dialing unbound");
            }
        }
        tokio::time::timeout(timeout, socket.connect(target))
            .await
            .map_err(|_| GatewayError::Timeout)?
            .map_err(GatewayError::Io)
    }
}

async fn dial_with_retry(target: SocketAddr, local_ip: Option<IpAddr>, timeout: Duration) -> Result<(TcpStream, Option<IpAddr>)> {
    let is_v6 = target.is_ipv6();
    match connect_ext::connect(is_v6, local_ip, target, timeout).await {
        Ok(stream) => Ok((stream, local_ip)),
        Err(GatewayError::Io(e))
            if local_ip.is_some() && e.raw_os_error() == Some(libc_cannot_assign_address()) =>
        {
            debug!(%target, "cannot assign requested address, retrying without source bind");
            let stream = connect_ext::connect(is_v6, None, target, timeout).await?;
            Ok((stream, None))
        }
        Err(e) => Err(e),
    }
}

/// `EADDRNOTAVAIL`, hardcoded rather than pulled from `libc` since this is
/// the only place the crate would need that dependency.
fn libc_cannot_assign_address() -> i32 {
    99
}

fn server_name(domain: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(domain.to_string())
        .map_err(|e| GatewayError::Tls(format!("invalid server name {domain:?}: {e}")))
}

/// Dials, optionally TLS-handshakes, and negotiates HTTP/1.1 or HTTP/2 for
/// one new connection to `target_ip`. The background connection-driver task
/// is detached; it exits when its `SendRequest` handle is dropped.
pub async fn establish(
    domain: &str,
    target_ip: IpAddr,
    port: u16,
    local_ip: Option<IpAddr>,
    https: bool,
    profile: &'static FingerprintProfile,
    tls_factory: &TlsClientFactory,
    dial_timeout: Duration,
) -> Result<Established> {
    let local_ip = match (target_ip, local_ip) {
        (IpAddr::V4(_), Some(IpAddr::V6(_))) | (IpAddr::V6(_), Some(IpAddr::V4(_))) => None,
        (_, other) => other,
    };

    let target_addr = SocketAddr::new(target_ip, port);
    let (stream, used_local_ip) = dial_with_retry(target_addr, local_ip, dial_timeout).await?;

    if !https {
        let io = TokioIo::new(stream);
        let (send_request, conn) = http1::handshake(io)
            .await
            .map_err(|e| GatewayError::Tls(format!("h1 handshake failed: {e}")))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "h1 connection driver exited");
            }
        });
        return Ok(Established { handle: ProtocolHandle::Http1(send_request), local_ip: used_local_ip });
    }

    let client_config: Arc<ClientConfig> = tls_factory.config_for(profile)?;
    let connector = TlsConnector::from(client_config);
    let name = server_name(domain)?;
    let tls_stream = connector
        .connect(name, stream)
        .await
        .map_err(|e| GatewayError::Tls(format!("tls handshake failed: {e}")))?;

    let negotiated_h2 = tls_stream
        .get_ref()
        .1
        .alpn_protocol()
        .map(|p| p == b"h2")
        .unwrap_or(false);

    let io = TokioIo::new(tls_stream);
    if negotiated_h2 {
        let (send_request, conn) = http2::Builder::new(TokioExecutor::new())
            .handshake(io)
            .await
            .map_err(|e| GatewayError::Tls(format!("h2 handshake failed: {e}")))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "h2 connection driver exited");
            }
        });
        Ok(Established { handle: ProtocolHandle::Http2(send_request), local_ip: used_local_ip })
    } else {
        let (send_request, conn) = http1::handshake(io)
            .await
            .map_err(|e| GatewayError::Tls(format!("h1 handshake failed: {e}")))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "h1 connection driver exited");
            }
        });
        Ok(Established { handle: ProtocolHandle::Http1(send_request), local_ip: used_local_ip })
    }
}

fn build_request(req: &FetchRequest, profile: Option<&'static FingerprintProfile>, library: &FingerprintLibrary) -> Result<hyper::Request<Full<Bytes>>> {
    let uri: hyper::Uri = req.url.parse().map_err(|e| GatewayError::Tls(format!("invalid url: {e}")))?;
    let mut builder = hyper::Request::builder()
        .method(req.method.as_str())
        .uri(uri)
        .header(hyper::header::HOST, req.domain.clone());

    let has_ua = req.headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent"));
    let has_al = req.headers.keys().any(|k| k.eq_ignore_ascii_case("accept-language"));

    for (k, v) in &req.headers {
        builder = builder.header(k.as_str(), v.as_str());
    }

    if !has_ua {
        let ua = profile.map(|p| p.user_agent).unwrap_or_else(|| library.random_profile().user_agent);
        builder = builder.header(hyper::header::USER_AGENT, ua);
    }
    if !has_al {
        builder = builder.header(hyper::header::ACCEPT_LANGUAGE, super::super::fingerprint::random_accept_language());
    }

    builder
        .body(Full::new(Bytes::from(req.body.clone())))
        .map_err(|e| GatewayError::Tls(format!("failed to build request: {e}")))
}

async fn send_once(
    handle: &mut ProtocolHandle,
    request: hyper::Request<Full<Bytes>>,
) -> Result<(u16, Vec<u8>)> {
    let response = match handle {
        ProtocolHandle::Http1(send_request) => send_request
            .send_request(request)
            .await
            .map_err(|e| GatewayError::Tls(e.to_string()))?,
        ProtocolHandle::Http2(send_request) => send_request
            .send_request(request)
            .await
            .map_err(|e| GatewayError::Tls(e.to_string()))?,
    };

    let status = response.status().as_u16();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| GatewayError::Tls(e.to_string()))?
        .to_bytes()
        .to_vec();
    Ok((status, body))
}

/// Sends `request` over an already-established connection and reads the
/// full response. Used by the dispatcher, which acquires connections from
/// the hot pool rather than dialing a fresh one per request.
pub async fn send_over(handle: &mut ProtocolHandle, request: hyper::Request<Full<Bytes>>) -> Result<(u16, Vec<u8>)> {
    send_once(handle, request).await
}

/// Fetch client entry point: dial, handshake, send, read — with up to 3
/// internal retries on classified connectivity errors. Timeouts and
/// non-2xx statuses are returned as-is; the dispatcher owns the outer retry.
pub struct FetchClient {
    tls_factory: Arc<TlsClientFactory>,
    library: Arc<FingerprintLibrary>,
}

impl FetchClient {
    pub fn new(tls_factory: Arc<TlsClientFactory>, library: Arc<FingerprintLibrary>) -> Self {
        Self { tls_factory, library }
    }

    pub async fn do_request(&self, req: FetchRequest) -> Result<FetchResponse> {
        let https = req.url.starts_with("https://");
        let port = if https { 443 } else { 80 };
        let profile = req.fingerprint.unwrap_or_else(|| self.library.random_profile());

        let mut last_err = None;
        for attempt in 0..3u32 {
            let start = Instant::now();
            let established = establish(
                &req.domain,
                req.target_ip,
                port,
                req.local_ip,
                https,
                profile,
                &self.tls_factory,
                req.timeout,
            )
            .await;

            let mut established = match established {
                Ok(e) => e,
                Err(e) => {
                    last_err = Some(e);
                    continue;
                }
            };

            let request = build_request(&req, Some(profile), &self.library)?;
            match tokio::time::timeout(req.timeout, send_once(&mut established.handle, request)).await {
                Ok(Ok((status, body))) => {
                    return Ok(FetchResponse {
                        status,
                        body,
                        duration: start.elapsed(),
                        local_ip: established.local_ip,
                    });
                }
                Ok(Err(e)) if is_retryable(&e.to_string()) && attempt < 2 => {
                    last_err = Some(e);
                    continue;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(GatewayError::Timeout),
            }
        }

        Err(last_err.unwrap_or(GatewayError::MaxRetriesExceeded))
    }
}
