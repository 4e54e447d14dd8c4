//! Browser-impersonating HTTPS fetch gateway: a domain IP monitor, a local
//! egress IP pool, a TLS-fingerprinted hot connection pool, and an RPC
//! dispatcher sit on top of a shared fingerprint catalog and access
//! controller.

pub mod access;
pub mod config;
pub mod dispatch;
pub mod egress;
pub mod error;
pub mod fetch;
pub mod fingerprint;
pub mod monitor;
pub mod pool;
pub mod telemetry;

pub use error::{GatewayError, Result};
