use hyper::Response;
use hyper::StatusCode;
use serde_json::json;

use crate::error::{ProxyError, Result};
use crate::proxy::synthetic_response::{full_body, RespBody};

fn json_response(status: StatusCode, body: &serde_json::Value) -> Result<Response<RespBody>> {
    let body_bytes = serde_json::to_vec(body)
        .map_err(|e| ProxyError::Http(format!("Failed to serialize health response: {e}")))?;

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full_body(body_bytes))
        .map_err(|e| ProxyError::Http(format!("Failed to build health response: {e}")))
}

/// Health check response - always returns 200 if process is running
pub fn health_check_response() -> Result<Response<RespBody>> {
    json_response(StatusCode::OK, &json!({"status": "healthy"}))
}

/// Readiness check - returns 200 if at least one analytics client is configured, 503 otherwise
pub fn ready_check_response(clients: usize) -> Result<Response<RespBody>> {
    if clients == 0 {
        json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &json!({
                "status": "not_ready",
                "reason": "no_clients_configured"
            }),
        )
    } else {
        json_response(StatusCode::OK, &json!({"status": "ready", "clients": clients}))
    }
}
