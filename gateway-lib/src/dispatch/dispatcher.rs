use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::access::IpAccessController;
use crate::config::TargetConfig;
use crate::error::{GatewayError, Result};
use crate::fetch;
use crate::fingerprint::FingerprintLibrary;
use crate::pool::HotConnectionPool;
use crate::telemetry::Metrics;

use super::admission::AdmissionGate;
use super::spillover;
use super::types::{TaskRequest, TaskResponse};

const MAX_ATTEMPTS: usize = 5;
const SERVER_TIMEOUT: Duration = Duration::from_secs(2);

/// Admits, dispatches, and responds to one `Execute` call against a single
/// fixed target domain's hot connection pool.
pub struct Dispatcher {
    pool: Arc<HotConnectionPool>,
    access: Arc<IpAccessController>,
    target_config: TargetConfig,
    target_domain: String,
    library: Arc<FingerprintLibrary>,
    admission: AdmissionGate,
    cursor: AtomicUsize,
    temp_file_dir: PathBuf,
    metrics: Arc<Metrics>,
}

enum DispatchOutcome {
    Timeout,
    WhitelistEmpty,
    MaxRetriesExceeded,
    RemoteStatus(u16, String),
}

enum AttemptOutcome {
    Success(u16, Vec<u8>),
    ConnectivityError(GatewayError),
}

impl Dispatcher {
    pub fn new(
        pool: Arc<HotConnectionPool>,
        access: Arc<IpAccessController>,
        target_config: TargetConfig,
        target_domain: String,
        library: Arc<FingerprintLibrary>,
        concurrency: usize,
        temp_file_dir: PathBuf,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            pool,
            access,
            target_config,
            target_domain,
            library,
            admission: AdmissionGate::new(concurrency, metrics.clone()),
            cursor: AtomicUsize::new(0),
            temp_file_dir,
            metrics,
        }
    }

    pub async fn execute(&self, request: TaskRequest) -> TaskResponse {
        let client_id = request.client_id;
        let started = Instant::now();

        let guard = match self.admission.acquire().await {
            Ok(guard) => guard,
            Err(_) => return TaskResponse::failure(client_id, "server busy"),
        };

        let path = match normalize_path(&request.path) {
            Some(path) => path,
            None => {
                self.metrics.dispatch_errors_total.add(1, &[]);
                return TaskResponse::failure(client_id, "path required");
            }
        };

        if !self.target_config.path_allowed(&path) {
            self.metrics.dispatch_errors_total.add(1, &[]);
            return TaskResponse::failure(client_id, "path not allowed for this target");
        }

        let outcome = self.dispatch_loop(&client_id, &path).await;
        drop(guard);
        self.metrics.dispatch_duration_seconds.record(started.elapsed().as_secs_f64(), &[]);

        match outcome {
            Ok((status, body)) => {
                self.metrics.response_body_bytes.record(body.len() as f64, &[]);
                match spillover::process_body(body, &client_id, &self.temp_file_dir).await {
                    Ok(body) => TaskResponse::success(client_id, status as i32, body),
                    Err(e) => {
                        self.metrics.dispatch_errors_total.add(1, &[]);
                        TaskResponse::failure(client_id, format!("failed to stage response body: {e}"))
                    }
                }
            }
            Err(DispatchOutcome::Timeout) => {
                self.metrics.dispatch_errors_total.add(1, &[]);
                TaskResponse::failure(client_id, "timeout, please retry")
            }
            Err(DispatchOutcome::WhitelistEmpty) => {
                self.metrics.dispatch_errors_total.add(1, &[]);
                TaskResponse::failure(client_id, "whitelist empty")
            }
            Err(DispatchOutcome::MaxRetriesExceeded) => {
                self.metrics.dispatch_errors_total.add(1, &[]);
                TaskResponse::failure(client_id, "max retries exceeded")
            }
            Err(DispatchOutcome::RemoteStatus(status, message)) => {
                self.metrics.dispatch_errors_total.add(1, &[]);
                TaskResponse { client_id, status_code: status as i32, body: Vec::new(), error_message: message }
            }
        }
    }

    async fn dispatch_loop(&self, client_id: &str, path: &str) -> std::result::Result<(u16, Vec<u8>), DispatchOutcome> {
        for attempt in 0..MAX_ATTEMPTS {
            let whitelist = self.access.allowed_snapshot().await;
            if whitelist.is_empty() {
                return Err(DispatchOutcome::WhitelistEmpty);
            }

            let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % whitelist.len();
            let target_ip: IpAddr = match whitelist[idx].parse() {
                Ok(ip) => ip,
                Err(_) => continue,
            };

            let work_id = format!("rpc-{client_id}-{attempt}");
            let last_attempt = attempt + 1 == MAX_ATTEMPTS;
            self.metrics.dispatch_attempts_total.add(1, &[]);

            match tokio::time::timeout(SERVER_TIMEOUT, self.attempt_once(target_ip, path)).await {
                Ok(AttemptOutcome::Success(status, body)) if status == 200 => return Ok((status, body)),
                Ok(AttemptOutcome::Success(status, _)) => {
                    return Err(DispatchOutcome::RemoteStatus(status, format!("remote returned status {status}")));
                }
                Ok(AttemptOutcome::ConnectivityError(e)) => {
                    if last_attempt {
                        warn!(work_id, error = %e, "dispatch attempt failed on final retry");
                        return Err(DispatchOutcome::MaxRetriesExceeded);
                    }
                    debug!(work_id, error = %e, "dispatch attempt failed, retrying");
                }
                Err(_) => return Err(DispatchOutcome::Timeout),
            }
        }
        Err(DispatchOutcome::MaxRetriesExceeded)
    }

    async fn attempt_once(&self, target_ip: IpAddr, path: &str) -> AttemptOutcome {
        let mut conn = match self.pool.acquire_for(target_ip).await {
            Ok(conn) => conn,
            Err(e) => return AttemptOutcome::ConnectivityError(e),
        };

        let request = match self.build_request(path) {
            Ok(r) => r,
            Err(e) => {
                self.pool.return_conn(conn, 0).await;
                return AttemptOutcome::ConnectivityError(e);
            }
        };

        match fetch::send_over(&mut conn.handle, request).await {
            Ok((status, body)) => {
                self.pool.return_conn(conn, status).await;
                AttemptOutcome::Success(status, body)
            }
            Err(e) => {
                self.pool.return_conn(conn, 0).await;
                AttemptOutcome::ConnectivityError(e)
            }
        }
    }

    fn build_request(&self, path: &str) -> Result<hyper::Request<Full<Bytes>>> {
        let per_path_headers = self.target_config.headers.get(path);
        let has_ua = per_path_headers
            .map(|h| h.keys().any(|k| k.eq_ignore_ascii_case("user-agent")))
            .unwrap_or(false);

        let mut builder = hyper::Request::builder()
            .method(hyper::Method::GET)
            .uri(path)
            .header(hyper::header::HOST, self.target_domain.clone());

        if let Some(headers) = per_path_headers {
            for (k, v) in headers {
                builder = builder.header(k.as_str(), v.as_str());
            }
        }
        if !has_ua {
            builder = builder.header(hyper::header::USER_AGENT, self.library.random_profile().user_agent);
        }
        builder = builder.header(hyper::header::ACCEPT_LANGUAGE, crate::fingerprint::random_accept_language());

        builder
            .body(Full::new(Bytes::new()))
            .map_err(|e| GatewayError::Tls(format!("failed to build request: {e}")))
    }
}

/// `"" ⇒ None` (path required); otherwise a leading `/` is added if missing.
fn normalize_path(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    if path.starts_with('/') {
        Some(path.to_string())
    } else {
        Some(format!("/{path}"))
    }
}
