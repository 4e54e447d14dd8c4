use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gateway_lib::config::load_from_path;

fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_nanos();
    std::env::temp_dir().join(format!("gateway-{nanos}-{name}.toml"))
}

#[test]
fn loads_minimal_config() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("minimal");
    let toml = r#"
[server]
server_port = 9000

[dns]
hostnames = ["example.com"]
storage_dir = "/tmp/gateway-dns"

[hot_pools.example]
target_domain = "example.com"
max_conns = 10
warmup_path = "/healthz"
"#;
    fs::write(&path, toml)?;

    let cfg = load_from_path(&path)?;
    assert_eq!(cfg.server.server_port, 9000);
    assert_eq!(cfg.hot_pools.len(), 1);
    assert!(!cfg.server.quic_enabled);
    assert_eq!(cfg.pool.concurrency, 500);
    assert_eq!(cfg.logging.level, "info");
    assert!(cfg.telemetry.metrics_port.is_none());
    Ok(())
}

#[test]
fn loads_targets_and_per_path_allowlist() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("targets");
    let toml = r#"
[server]
server_port = 9001

[dns]
hostnames = ["example.com"]
storage_dir = "/tmp/gateway-dns"

[hot_pools.example]
target_domain = "example.com"
max_conns = 10
warmup_path = "/healthz"

[targets.example]
paths = ["/a", "/b"]
"#;
    fs::write(&path, toml)?;

    let cfg = load_from_path(&path)?;
    let target = cfg.target_for("example.com");
    assert!(target.path_allowed("/a"));
    assert!(!target.path_allowed("/c"));

    let unconfigured = cfg.target_for("unlisted.invalid");
    assert!(unconfigured.path_allowed("/anything"));
    Ok(())
}

#[test]
fn rejects_target_domain_missing_from_dns_hostnames() {
    let path = tmp_path("mismatch");
    let toml = r#"
[server]
server_port = 9002

[dns]
hostnames = ["example.com"]
storage_dir = "/tmp/gateway-dns"

[hot_pools.other]
target_domain = "other.com"
max_conns = 10
warmup_path = "/healthz"
"#;
    fs::write(&path, toml).unwrap();

    assert!(load_from_path(&path).is_err());
}

#[test]
fn rejects_missing_hot_pools() {
    let path = tmp_path("no-pools");
    let toml = r#"
[server]
server_port = 9003

[dns]
hostnames = ["example.com"]
storage_dir = "/tmp/gateway-dns"

[hot_pools]
"#;
    fs::write(&path, toml).unwrap();

    assert!(load_from_path(&path).is_err());
}
