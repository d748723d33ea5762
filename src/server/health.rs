//! Liveness probe.

use axum::http::StatusCode;

/// Returns `200 OK` while the process is serving requests.
///
/// It does not touch the watched checkout, so a broken repository never
/// makes the receiver look dead.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
