//! Health handlers.
//!
//! - GET /healthz  -> liveness plus a count of hosted buckets

use crate::services::storage_service::StorageService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Always returns 200 OK with a small JSON body.
pub async fn healthz(State(service): State<StorageService>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
            buckets: service.list_buckets().await.len(),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    buckets: usize,
}
