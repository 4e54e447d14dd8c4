use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::error::{GatewayError, Result};

/// Installs the global tracing subscriber. `RUST_LOG` overrides the
/// configured level entirely when set.
pub fn init_tracing(logging: &LoggingConfig, otel_log_level: &str) -> Result<()> {
    let filter_str = format!("{},opentelemetry={}", logging.level, otel_log_level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter_str));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(logging.show_target);

    let subscriber = Registry::default().with(env_filter).with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| GatewayError::Config(format!("failed to set global tracing subscriber: {e}")))
}

/// Flushes stdout/stderr so buffered log lines are not lost on exit.
pub fn shutdown_tracing() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}
