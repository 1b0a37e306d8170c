//! Defines routes for the MS3 wire contract.
//!
//! ## Structure
//! - **Bucket endpoints**
//!   - `GET    /api/buckets/list` — list buckets
//!   - `PUT    /api/buckets/create/{bucket}` — create bucket
//!   - `GET    /api/bucket/list/{*segment}` — list objects of `{prefix}{bucket}`
//!
//! - **Object endpoints**
//!   - `PUT    /api/bucket/object/{bucket}/{*key}` — upload object
//!   - `GET    /api/bucket/object/{bucket}/{*key}` — download object
//!   - `GET    /api/bucket/metadata/{bucket}/{*key}` — metadata only
//!   - `GET    /api/bucket/generateuri/{bucket}/{*key}` — access URI
//!
//! The wildcard `*key` allows nested keys like `photos/2025/img.jpg`.

use crate::{
    handlers::{
        health_handlers::healthz,
        object_handlers::{
            create_bucket, generate_uri, get_metadata, get_object, list_buckets, list_objects,
            put_object,
        },
    },
    services::storage_service::StorageService,
};
use axum::{
    Router,
    routing::{get, put},
};

/// Build and return the router for the MS3 API.
///
/// The router carries shared state (`StorageService`) to all handlers.
pub fn routes() -> Router<StorageService> {
    Router::new()
        .route("/healthz", get(healthz))
        // Bucket-level routes
        .route("/api/buckets/list", get(list_buckets))
        .route("/api/buckets/create/{bucket}", put(create_bucket))
        .route("/api/bucket/list/{*segment}", get(list_objects))
        // Object-level routes
        .route(
            "/api/bucket/object/{bucket}/{*key}",
            put(put_object).get(get_object),
        )
        .route("/api/bucket/metadata/{bucket}/{*key}", get(get_metadata))
        .route("/api/bucket/generateuri/{bucket}/{*key}", get(generate_uri))
}

/// The router with a fresh in-memory store attached.
pub fn app(service: StorageService) -> Router {
    routes().with_state(service)
}
