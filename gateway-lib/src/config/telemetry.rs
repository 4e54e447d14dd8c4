use serde::Deserialize;

/// Observability configuration: metrics export and OpenTelemetry internals.
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Port for the standalone metrics/health HTTP server.
    /// `None` disables the telemetry server entirely.
    #[serde(default)]
    pub metrics_port: Option<u16>,
    /// Verbosity of OpenTelemetry SDK's own internal logs (not application logs).
    #[serde(default = "default_otel_log_level")]
    pub otel_log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { metrics_port: None, otel_log_level: default_otel_log_level() }
    }
}

fn default_otel_log_level() -> String {
    "warn".to_string()
}
