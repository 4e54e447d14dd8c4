mod health;
mod metrics;
mod metrics_handler;
mod server;
mod tracing;

pub use health::{health_check_response, live_check_response, ready_check_response};
pub use metrics::{init_metrics, Metrics};
pub use metrics_handler::handle_metrics;
pub use server::start as start_telemetry_server;
pub use tracing::{init_tracing, shutdown_tracing};
