use std::path::{Path, PathBuf};

use crate::config::StorageFormat;
use crate::error::{GatewayError, Result};

use super::types::DomainPool;

/// Domain names go on disk with dots escaped so every supported domain maps
/// to a single, filesystem-safe file name.
fn escape_domain(domain: &str) -> String {
    domain.replace('.', "_")
}

pub fn record_path(storage_dir: &Path, domain: &str, format: StorageFormat) -> PathBuf {
    storage_dir.join(format!("{}.{}", escape_domain(domain), format.extension()))
}

pub async fn load(storage_dir: &Path, domain: &str, format: StorageFormat) -> Result<DomainPool> {
    let path = record_path(storage_dir, domain, format);
    let raw = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(DomainPool::default()),
        Err(e) => return Err(GatewayError::Io(e)),
    };
    deserialize(&raw, format)
}

fn deserialize(raw: &[u8], format: StorageFormat) -> Result<DomainPool> {
    match format {
        StorageFormat::Json => Ok(serde_json::from_slice(raw)?),
        StorageFormat::Yaml => serde_norway::from_slice(raw)
            .map_err(|e| GatewayError::Config(format!("yaml decode error: {e}"))),
        StorageFormat::Toml => {
            let text = std::str::from_utf8(raw)
                .map_err(|e| GatewayError::Config(format!("toml file is not utf8: {e}")))?;
            Ok(toml::from_str(text)?)
        }
    }
}

fn serialize(pool: &DomainPool, format: StorageFormat) -> Result<Vec<u8>> {
    match format {
        StorageFormat::Json => Ok(serde_json::to_vec_pretty(pool)?),
        StorageFormat::Yaml => serde_norway::to_string(pool)
            .map(|s| s.into_bytes())
            .map_err(|e| GatewayError::Config(format!("yaml encode error: {e}"))),
        StorageFormat::Toml => toml::to_string_pretty(pool)
            .map(|s| s.into_bytes())
            .map_err(|e| GatewayError::Config(format!("toml encode error: {e}"))),
    }
}

/// Writes `pool` to a temp file in `storage_dir` and renames it into place,
/// which is atomic on the same filesystem. A write failure is the caller's
/// to log; it must never invalidate the in-memory state it mirrors.
pub async fn persist(
    storage_dir: &Path,
    domain: &str,
    format: StorageFormat,
    pool: &DomainPool,
) -> Result<()> {
    tokio::fs::create_dir_all(storage_dir).await?;
    let final_path = record_path(storage_dir, domain, format);
    let tmp_path = final_path.with_extension(format!("{}.tmp", format.extension()));
    let bytes = serialize(pool, format)?;
    tokio::fs::write(&tmp_path, &bytes).await?;
    tokio::fs::rename(&tmp_path, &final_path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::TargetIpRecord;

    #[test]
    fn escapes_dots_in_domain() {
        assert_eq!(escape_domain("example.com"), "example_com");
    }

    #[tokio::test]
    async fn round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut pool = DomainPool::default();
        pool.insert(TargetIpRecord::new("1.2.3.4".parse().unwrap()));
        persist(dir.path(), "example.com", StorageFormat::Json, &pool).await.unwrap();
        let loaded = load(dir.path(), "example.com", StorageFormat::Json).await.unwrap();
        assert_eq!(loaded, pool);
    }

    #[tokio::test]
    async fn round_trips_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let mut pool = DomainPool::default();
        pool.insert(TargetIpRecord::new("::1".parse().unwrap()));
        persist(dir.path(), "example.com", StorageFormat::Yaml, &pool).await.unwrap();
        let loaded = load(dir.path(), "example.com", StorageFormat::Yaml).await.unwrap();
        assert_eq!(loaded, pool);
    }

    #[tokio::test]
    async fn missing_file_yields_empty_pool() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load(dir.path(), "never-seen.com", StorageFormat::Json).await.unwrap();
        assert_eq!(loaded, DomainPool::default());
    }
}
