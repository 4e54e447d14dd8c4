mod client;
mod request;
mod retry;

pub use client::{establish, send_over, Established, FetchClient, ProtocolHandle};
pub use request::{FetchRequest, FetchResponse};
pub use retry::is_retryable;
