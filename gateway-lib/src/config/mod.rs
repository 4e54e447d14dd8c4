mod dns;
mod hot_pool;
mod loader;
mod logging;
mod pool;
mod root;
mod server;
mod target;
mod telemetry;
mod utls;

pub use dns::{default_dns_servers, DnsConfig, StorageFormat};
pub use hot_pool::HotPoolConfig;
pub use loader::{load_from_path, validate_config};
pub use logging::LoggingConfig;
pub use pool::PoolConfig;
pub use root::Config;
pub use server::ServerConfig;
pub use target::TargetConfig;
pub use telemetry::TelemetryConfig;
pub use utls::UtlsConfig;
