use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use quinn::{Endpoint, EndpointConfig, IdleTimeout, ServerConfig as QuinnServerConfig, TokioRuntime, TransportConfig};
use rustls_pemfile::{certs, pkcs8_private_keys, rsa_private_keys};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig as RustlsServerConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Result};

use super::dispatcher::Dispatcher;
use super::types::TaskRequest;

const MAX_REQUEST_BYTES: u32 = 16 * 1024 * 1024;

/// Loads the same cert/key formats the RPC-adjacent TCP TLS listener
/// accepts: PKCS8, falling back to RSA.
fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let parsed = certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| GatewayError::Tls(format!("failed to read quic certs: {e}")))?;
    if parsed.is_empty() {
        return Err(GatewayError::Config("no certificates found in quic_cert_file".to_string()));
    }
    Ok(parsed)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut pkcs8 = pkcs8_private_keys(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| GatewayError::Tls(format!("failed to read quic pkcs8 key: {e}")))?;
    if let Some(key) = pkcs8.pop() {
        return Ok(PrivateKeyDer::from(key));
    }

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut rsa = rsa_private_keys(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| GatewayError::Tls(format!("failed to read quic rsa key: {e}")))?;
    if let Some(key) = rsa.pop() {
        return Ok(PrivateKeyDer::from(key));
    }

    Err(GatewayError::Config("no private key found in quic_key_file (pkcs8 or rsa)".to_string()))
}

fn build_endpoint(
    addr: SocketAddr,
    cert_path: &Path,
    key_path: &Path,
    alpn: &str,
    max_idle_timeout_s: u64,
) -> Result<Endpoint> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;

    let mut rustls_config = RustlsServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| GatewayError::Tls(format!("failed to build quic tls config: {e}")))?;
    rustls_config.alpn_protocols = vec![alpn.as_bytes().to_vec()];

    let quic_crypto = quinn::crypto::rustls::QuicServerConfig::try_from(rustls_config)
        .map_err(|e| GatewayError::Tls(format!("rustls config incompatible with quic: {e}")))?;
    let mut server_config = QuinnServerConfig::with_crypto(Arc::new(quic_crypto));

    let mut transport = TransportConfig::default();
    transport.max_idle_timeout(Some(
        IdleTimeout::try_from(Duration::from_secs(max_idle_timeout_s))
            .map_err(|e| GatewayError::Config(format!("invalid quic_max_idle_timeout_s: {e}")))?,
    ));
    server_config.transport_config(Arc::new(transport));

    // A dedicated socket2::Socket lets the UDP endpoint carry a larger
    // receive buffer than the OS default before handing it to quinn, which
    // otherwise binds an unconfigured std::net::UdpSocket internally.
    let domain = if addr.is_ipv6() { socket2::Domain::IPV6 } else { socket2::Domain::IPV4 };
    let socket = socket2::Socket::new(domain, socket2::Type::DGRAM, Some(socket2::Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(4 * 1024 * 1024)?;
    socket.set_send_buffer_size(4 * 1024 * 1024)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    Endpoint::new(EndpointConfig::default(), Some(server_config), socket.into(), Arc::new(TokioRuntime))
        .map_err(GatewayError::Io)
}

/// Serves `Execute` over QUIC: one bidirectional stream per request, framed
/// as a 4-byte big-endian length prefix followed by a JSON body.
pub async fn serve(
    addr: SocketAddr,
    cert_path: &Path,
    key_path: &Path,
    alpn: &str,
    max_idle_timeout_s: u64,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) -> Result<()> {
    let endpoint = build_endpoint(addr, cert_path, key_path, alpn, max_idle_timeout_s)?;
    info!(%addr, alpn, "quic listener started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("quic listener shutting down");
                endpoint.close(0u32.into(), b"shutting down");
                return Ok(());
            }
            incoming = endpoint.accept() => {
                let Some(incoming) = incoming else { return Ok(()) };
                let dispatcher = dispatcher.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    match incoming.await {
                        Ok(connection) => handle_connection(connection, dispatcher, cancel).await,
                        Err(e) => debug!(error = %e, "quic handshake failed"),
                    }
                });
            }
        }
    }
}

async fn handle_connection(connection: quinn::Connection, dispatcher: Arc<Dispatcher>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            accepted = connection.accept_bi() => {
                let (send, recv) = match accepted {
                    Ok(streams) => streams,
                    Err(e) => {
                        debug!(error = %e, "quic connection closed");
                        return;
                    }
                };
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_stream(send, recv, dispatcher).await {
                        warn!(error = %e, "quic stream handling failed");
                    }
                });
            }
        }
    }
}

async fn handle_stream(mut send: quinn::SendStream, mut recv: quinn::RecvStream, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let mut len_buf = [0u8; 4];
    recv.read_exact(&mut len_buf).await.map_err(|e| GatewayError::Frame(e.to_string()))?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_REQUEST_BYTES {
        return Err(GatewayError::Frame(format!("request of {len} bytes exceeds max of {MAX_REQUEST_BYTES}")));
    }

    let mut body = vec![0u8; len as usize];
    recv.read_exact(&mut body).await.map_err(|e| GatewayError::Frame(e.to_string()))?;

    let request: TaskRequest = serde_json::from_slice(&body)?;
    let response = dispatcher.execute(request).await;
    let encoded = serde_json::to_vec(&response)?;

    send.write_all(&(encoded.len() as u32).to_be_bytes()).await.map_err(|e| GatewayError::Frame(e.to_string()))?;
    send.write_all(&encoded).await.map_err(|e| GatewayError::Frame(e.to_string()))?;
    send.finish().map_err(|e| GatewayError::Frame(e.to_string()))?;
    Ok(())
}
