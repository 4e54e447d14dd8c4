pub mod accept_language;
pub mod catalog;
mod library;
mod profile;
mod tls_client;

pub use accept_language::random_accept_language;
pub use catalog::catalog;
pub use library::FingerprintLibrary;
pub use profile::{Browser, FingerprintProfile, Platform};
pub use tls_client::TlsClientFactory;
