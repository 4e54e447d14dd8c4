use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Result};

use super::dispatcher::Dispatcher;
use super::types::TaskRequest;

/// Serves `Execute` over a length-delimited, JSON-framed TCP transport
/// until `cancel` fires.
pub async fn serve(addr: SocketAddr, dispatcher: Arc<Dispatcher>, cancel: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "rpc listener started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("rpc listener shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let dispatcher = dispatcher.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, dispatcher, cancel).await {
                        debug!(%peer, error = %e, "rpc connection ended");
                    }
                });
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, dispatcher: Arc<Dispatcher>, cancel: CancellationToken) -> Result<()> {
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            frame = framed.next() => {
                let frame = match frame {
                    Some(Ok(frame)) => frame,
                    Some(Err(e)) => return Err(GatewayError::Frame(e.to_string())),
                    None => return Ok(()),
                };

                let request: TaskRequest = match serde_json::from_slice(&frame) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(error = %e, "failed to decode rpc request frame");
                        continue;
                    }
                };

                let response = dispatcher.execute(request).await;
                let encoded = serde_json::to_vec(&response)?;
                framed
                    .send(Bytes::from(encoded))
                    .await
                    .map_err(|e| GatewayError::Frame(e.to_string()))?;
            }
        }
    }
}
