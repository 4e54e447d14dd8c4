use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::Resolver;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// One server to consult for one domain's A/AAAA records.
pub struct ResolveJob {
    pub server: IpAddr,
}

#[derive(Debug, Default)]
pub struct ResolvedSets {
    pub ipv4: HashSet<Ipv4Addr>,
    pub ipv6: HashSet<Ipv6Addr>,
}

fn build_resolver(server: IpAddr) -> Resolver<TokioConnectionProvider> {
    let group = NameServerConfigGroup::from_ips_clear(&[server], 53, true);
    let config = ResolverConfig::from_parts(None, vec![], group);
    Resolver::builder_with_config(config, TokioConnectionProvider::default()).build()
}

async fn resolve_one(server: IpAddr, domain: &str, timeout: Duration) -> (Vec<Ipv4Addr>, Vec<Ipv6Addr>) {
    let resolver = build_resolver(server);

    let v4 = match tokio::time::timeout(timeout, resolver.ipv4_lookup(domain)).await {
        Ok(Ok(response)) => response.iter().map(|r| r.0).collect(),
        Ok(Err(e)) => {
            debug!(%server, domain, error = %e, "A lookup failed");
            Vec::new()
        }
        Err(_) => {
            warn!(%server, domain, "A lookup timed out");
            Vec::new()
        }
    };

    let v6 = match tokio::time::timeout(timeout, resolver.ipv6_lookup(domain)).await {
        Ok(Ok(response)) => response.iter().map(|r| r.0).collect(),
        Ok(Err(e)) => {
            debug!(%server, domain, error = %e, "AAAA lookup failed");
            Vec::new()
        }
        Err(_) => {
            warn!(%server, domain, "AAAA lookup timed out");
            Vec::new()
        }
    };

    (v4, v6)
}

/// Fans a domain's lookup out across `servers` through a worker pool capped
/// at `max_workers`, merging every server's answers into one result set.
pub async fn resolve_across_servers(
    domain: &str,
    servers: &[IpAddr],
    max_workers: usize,
    timeout: Duration,
) -> ResolvedSets {
    let deduped: Vec<IpAddr> = {
        let mut seen = HashSet::new();
        servers.iter().copied().filter(|s| seen.insert(*s)).collect()
    };

    let (tx, rx) = mpsc::channel(deduped.len().max(1));
    for server in &deduped {
        let _ = tx.send(ResolveJob { server: *server }).await;
    }
    drop(tx);

    let results = std::sync::Arc::new(Mutex::new(ResolvedSets::default()));
    let rx = std::sync::Arc::new(Mutex::new(rx));
    let worker_count = max_workers.min(deduped.len().max(1));

    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let rx = rx.clone();
        let results = results.clone();
        let domain = domain.to_string();
        handles.push(tokio::spawn(async move {
            loop {
                let job = {
                    let mut rx = rx.lock().await;
                    rx.recv().await
                };
                let Some(job) = job else { break };
                let (v4, v6) = resolve_one(job.server, &domain, timeout).await;
                let mut results = results.lock().await;
                results.ipv4.extend(v4);
                results.ipv6.extend(v6);
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    std::sync::Arc::try_unwrap(results)
        .map(|m| m.into_inner())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deduplicates_servers_before_dispatch() {
        let servers = vec!["1.1.1.1".parse().unwrap(), "1.1.1.1".parse().unwrap()];
        // Real DNS is reached here; this exercises dedup/fan-out wiring, not
        // network reachability, so we just assert it returns within budget.
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            resolve_across_servers("example.invalid", &servers, 4, Duration::from_millis(200)),
        )
        .await;
        assert!(result.is_ok());
    }
}
