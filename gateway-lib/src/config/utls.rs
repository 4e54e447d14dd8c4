use serde::Deserialize;

/// Per-fetch TLS/HTTP transport timing and retry policy.
#[derive(Debug, Deserialize, Clone)]
pub struct UtlsConfig {
    /// Timeout for reading a full response, in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Timeout for the TCP connect + TLS handshake, in seconds.
    #[serde(default = "default_dial_timeout")]
    pub dial_timeout_secs: u64,
    /// Maximum number of target IPs tried per `Execute` call before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl Default for UtlsConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: default_read_timeout(),
            dial_timeout_secs: default_dial_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl UtlsConfig {
    pub fn read_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.read_timeout_secs)
    }

    pub fn dial_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.dial_timeout_secs)
    }
}

fn default_read_timeout() -> u64 {
    15
}

fn default_dial_timeout() -> u64 {
    10
}

fn default_max_retries() -> usize {
    3
}
