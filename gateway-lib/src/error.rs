use thiserror::Error;

/// Errors that can occur anywhere in the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("DNS resolution error: {0}")]
    Dns(String),

    #[error("target IP {0} is not allowed (blacklisted or not whitelisted)")]
    NotAllowed(String),

    #[error("whitelist empty")]
    WhitelistEmpty,

    #[error("no usable local address available")]
    NoUsableAddress,

    #[error("max retries exceeded")]
    MaxRetriesExceeded,

    #[error("timeout, please retry")]
    Timeout,

    #[error("server busy")]
    ServerBusy,

    #[error("request cancelled")]
    Cancelled,

    #[error("path required")]
    PathRequired,

    #[error("remote returned status {0}")]
    RemoteStatus(u16),

    #[error("frame decode error: {0}")]
    Frame(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
