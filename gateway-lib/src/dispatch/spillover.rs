use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::error::Result;

pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;
pub const SPILL_THRESHOLD_BYTES: usize = 100 * 1024;

/// Deletes its temp file on drop, regardless of how the owning scope exits.
struct TempFileGuard(PathBuf);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            debug!(path = %self.0.display(), error = %e, "failed to remove spillover temp file");
        }
    }
}

/// Truncates oversize bodies, then spills anything over `SPILL_THRESHOLD_BYTES`
/// through a temp file and reads it back. This decouples the fetch-side
/// buffer lifetime from the RPC-send-side one, flattening peak memory use
/// when many large responses are in flight concurrently.
pub async fn process_body(mut body: Vec<u8>, client_id: &str, temp_dir: &std::path::Path) -> Result<Vec<u8>> {
    if body.len() > MAX_BODY_BYTES {
        warn!(client_id, original_len = body.len(), cap = MAX_BODY_BYTES, "response body exceeds cap, truncating");
        body.truncate(MAX_BODY_BYTES);
    }

    if body.len() <= SPILL_THRESHOLD_BYTES {
        return Ok(body);
    }

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let path = temp_dir.join(format!("resp_{client_id}_{nanos}_{}.tmp", body.len()));

    tokio::fs::write(&path, &body).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).await;
    }

    let guard = TempFileGuard(path.clone());
    let read_back = tokio::fs::read(&path).await?;
    drop(guard);
    Ok(read_back)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn small_body_passes_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let body = vec![1, 2, 3];
        let out = process_body(body.clone(), "client-1", dir.path()).await.unwrap();
        assert_eq!(out, body);
    }

    #[tokio::test]
    async fn oversize_body_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let body = vec![7u8; MAX_BODY_BYTES + 1024];
        let out = process_body(body, "client-1", dir.path()).await.unwrap();
        assert_eq!(out.len(), MAX_BODY_BYTES);
    }

    #[tokio::test]
    async fn large_body_round_trips_through_a_temp_file_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let body = vec![42u8; SPILL_THRESHOLD_BYTES + 1];
        let out = process_body(body.clone(), "client-1", dir.path()).await.unwrap();
        assert_eq!(out, body);

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none(), "temp file should be removed after spillover");
    }
}
