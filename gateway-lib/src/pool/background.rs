use std::sync::Arc;

use tracing::{debug, info, warn};

use super::hot_pool::HotConnectionPool;
use super::warmup::{warmup_many, warmup_many_inner};

/// Spawns the three background tickers that keep a hot pool's IP set and
/// connection queues fresh: IP refresh from the domain monitor, blacklist
/// retest, and a purge pass over dead connections. None of these purge on
/// an idle timer — connections are only ever removed for being unusable.
pub fn spawn_all(pool: Arc<HotConnectionPool>) {
    tokio::spawn(ip_refresh_loop(pool.clone()));
    tokio::spawn(blacklist_retest_loop(pool.clone()));
    tokio::spawn(purge_loop(pool));
}

async fn ip_refresh_loop(pool: Arc<HotConnectionPool>) {
    let period = std::time::Duration::from_secs(pool.config.ip_refresh_interval_minutes.max(1) * 60);
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = pool.cancel.cancelled() => return,
            _ = ticker.tick() => refresh_ips(&pool).await,
        }
    }
}

async fn refresh_ips(pool: &Arc<HotConnectionPool>) {
    let domain_pool = match pool.monitor.get_domain_pool(&pool.config.target_domain).await {
        Some(p) => p,
        None => return,
    };

    let ipv4: Vec<_> = domain_pool.ipv4.iter().map(|r| r.ip).collect();
    let ipv6: Vec<_> = domain_pool.ipv6.iter().map(|r| r.ip).collect();

    let (new_ips, auto_warmup_enabled) = {
        let mut state = pool.state.write().await;
        let new_ips = state.absorb_monitor_snapshot(&ipv4, &ipv6);
        (new_ips, state.auto_warmup_enabled)
    };

    if new_ips.is_empty() {
        return;
    }
    info!(domain = %pool.config.target_domain, count = new_ips.len(), "discovered new target ips");

    if auto_warmup_enabled {
        warmup_many(pool, new_ips).await;
    } else {
        // Pre-sweep startup: leave them in pending_warmups for the initial sweep to pick up.
        let mut state = pool.state.write().await;
        for ip in new_ips {
            if !state.pending_warmups.contains(&ip) {
                state.pending_warmups.push(ip);
            }
        }
    }
}

async fn blacklist_retest_loop(pool: Arc<HotConnectionPool>) {
    let period = std::time::Duration::from_secs(pool.config.blacklist_retest_interval_minutes.max(1) * 60);
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = pool.cancel.cancelled() => return,
            _ = ticker.tick() => retest_blacklist(&pool).await,
        }
    }
}

async fn retest_blacklist(pool: &Arc<HotConnectionPool>) {
    let known: std::collections::HashSet<std::net::IpAddr> =
        pool.state.read().await.known_ips.clone();
    let blocked = pool.access.blocked_snapshot().await;

    let candidates: Vec<std::net::IpAddr> = blocked
        .iter()
        .filter_map(|s| s.parse().ok())
        .filter(|ip| known.contains(ip))
        .collect();

    if candidates.is_empty() {
        return;
    }
    debug!(count = candidates.len(), "retesting blacklisted ips");
    warmup_many_inner(pool, candidates, true).await;
}

async fn purge_loop(pool: Arc<HotConnectionPool>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
    loop {
        tokio::select! {
            _ = pool.cancel.cancelled() => return,
            _ = ticker.tick() => purge_dead_connections(&pool).await,
        }
    }
}

async fn purge_dead_connections(pool: &Arc<HotConnectionPool>) {
    let purged = pool.purge_dead_connections().await;
    if purged > 0 {
        warn!(purged, domain = %pool.config.target_domain, "purged dead connections");
    }
}
