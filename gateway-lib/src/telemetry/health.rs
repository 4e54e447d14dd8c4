use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;
use hyper::StatusCode;
use serde_json::json;

use crate::error::{GatewayError, Result};
use crate::pool::HotConnectionPool;

type RespBody = BoxBody<Bytes, hyper::Error>;

fn json_response(status: StatusCode, body: serde_json::Value) -> Result<Response<RespBody>> {
    let bytes = serde_json::to_vec(&body)?;
    let body = Full::new(Bytes::from(bytes)).map_err(|never| match never {}).boxed();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(body)
        .map_err(|e| GatewayError::Http(format!("failed to build health response: {e}")))
}

/// Always 200 while the process is alive and able to answer HTTP at all.
pub fn health_check_response() -> Result<Response<RespBody>> {
    json_response(StatusCode::OK, json!({"status": "healthy"}))
}

/// Ready once every configured hot pool has discovered at least one target
/// IP; an empty pool has nothing to dispatch requests to yet.
pub async fn ready_check_response(pools: &[std::sync::Arc<HotConnectionPool>]) -> Result<Response<RespBody>> {
    if pools.is_empty() {
        return json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"status": "not_ready", "reason": "no_hot_pools_configured"}),
        );
    }

    for pool in pools {
        if pool.known_ip_count().await == 0 {
            return json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"status": "not_ready", "reason": "no_target_ips_discovered_yet"}),
            );
        }
    }

    json_response(StatusCode::OK, json!({"status": "ready"}))
}

/// Always 200 while the process is alive; distinct from readiness so an
/// orchestrator restarts only on deadlock/panic, not on cold-start warmup.
pub fn live_check_response() -> Result<Response<RespBody>> {
    json_response(StatusCode::OK, json!({"status": "alive"}))
}
