use std::net::IpAddr;
use std::time::Instant;

use crate::fetch::ProtocolHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiatedProtocol {
    Http1,
    Http2,
}

/// One live TLS connection, owned at any instant by exactly one actor:
/// either parked in the pool (idle) or held by a caller (in flight).
pub struct ConnectionMetadata {
    pub target_ip: IpAddr,
    pub local_ip: Option<IpAddr>,
    pub negotiated_protocol: NegotiatedProtocol,
    pub created_at: Instant,
    pub last_used_at: Instant,
    pub handle: ProtocolHandle,
}

impl ConnectionMetadata {
    pub fn new(target_ip: IpAddr, local_ip: Option<IpAddr>, handle: ProtocolHandle) -> Self {
        let negotiated_protocol = match handle {
            ProtocolHandle::Http1(_) => NegotiatedProtocol::Http1,
            ProtocolHandle::Http2(_) => NegotiatedProtocol::Http2,
        };
        let now = Instant::now();
        Self { target_ip, local_ip, negotiated_protocol, created_at: now, last_used_at: now, handle }
    }

    pub fn touch(&mut self) {
        self.last_used_at = Instant::now();
    }

    /// Whether the underlying handle still looks usable. h1/h2 `SendRequest`
    /// handles report readiness via `is_ready`; a connection whose driver
    /// task has already exited (peer closed) is not.
    pub fn is_usable(&self) -> bool {
        match &self.handle {
            ProtocolHandle::Http1(send_request) => !send_request.is_closed(),
            ProtocolHandle::Http2(send_request) => !send_request.is_closed(),
        }
    }
}
