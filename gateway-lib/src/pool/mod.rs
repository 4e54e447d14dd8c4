mod background;
mod connection;
mod hot_pool;
mod state;
mod warmup;

pub use connection::{ConnectionMetadata, NegotiatedProtocol};
pub use hot_pool::{HotConnectionPool, STATUS_CONNECTIVITY_ERROR};
pub use state::{IpStats, PoolState};

use std::sync::Arc;

/// Starts a freshly constructed pool: runs the blocking initial warmup
/// sweep, then hands off to the three background tickers.
pub async fn start(pool: Arc<HotConnectionPool>) {
    warmup::run_initial_sweep(&pool).await;
    background::spawn_all(pool);
}
