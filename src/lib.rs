//! Client for MS3, a small object-storage HTTP API.
//!
//! [`ObjectStoreClient`] covers the whole API surface: list and create
//! buckets, list objects, get and put objects with metadata, fetch metadata
//! and generate access URLs. The crate also ships an in-memory reference
//! server ([`routes::routes::app`]) speaking the same wire contract, used by
//! the `ms3 serve` command and by the integration tests.

pub mod client;
pub mod errors;
pub mod framing;
pub mod handlers;
pub mod models;
pub mod paths;
pub mod routes;
pub mod services;

pub use client::{
    ClientBuilder, DEFAULT_SERVER_URL_ENV, ObjectContent, ObjectHandle, ObjectStoreClient,
    PutResult, WaiterConfig, Waiters,
};
pub use errors::{ClientError, ClientResult};
pub use models::{Bucket, ObjectMetadata, ObjectSummary};
