mod admission;
mod dispatcher;
mod quic_server;
mod rpc_server;
mod spillover;
mod types;

pub use admission::{AdmissionGate, AdmissionGuard};
pub use dispatcher::Dispatcher;
pub use quic_server::serve as serve_quic;
pub use rpc_server::serve as serve_rpc;
pub use types::{TaskRequest, TaskResponse};
