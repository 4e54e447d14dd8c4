use serde::Deserialize;
use std::path::PathBuf;

/// RPC front-end listener configuration: the framed TCP transport and the
/// optional parallel QUIC transport.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Port for the length-delimited framed TCP RPC listener.
    pub server_port: u16,
    /// Enable the parallel QUIC listener.
    #[serde(default)]
    pub quic_enabled: bool,
    /// Port for the QUIC listener. Only used when `quic_enabled`.
    #[serde(default = "default_quic_port")]
    pub quic_port: u16,
    /// PEM certificate chain for the QUIC TLS 1.3 endpoint.
    #[serde(default)]
    pub quic_cert_file: Option<PathBuf>,
    /// PEM private key for the QUIC TLS 1.3 endpoint.
    #[serde(default)]
    pub quic_key_file: Option<PathBuf>,
    /// Optional client CA bundle for the QUIC endpoint.
    #[serde(default)]
    pub quic_ca_file: Option<PathBuf>,
    /// ALPN protocol advertised by the QUIC endpoint.
    #[serde(default = "default_quic_alpn")]
    pub quic_alpn: String,
    /// Idle timeout for QUIC connections, in seconds.
    #[serde(default = "default_quic_idle_timeout")]
    pub quic_max_idle_timeout_s: u64,
    /// Directory used for response-body spillover temp files.
    #[serde(default = "default_temp_file_dir")]
    pub temp_file_dir: PathBuf,
}

fn default_quic_port() -> u16 {
    7443
}

fn default_quic_alpn() -> String {
    "utls-proxy-quic".to_string()
}

fn default_quic_idle_timeout() -> u64 {
    30
}

fn default_temp_file_dir() -> PathBuf {
    std::env::temp_dir()
}
