//! Data models for the MS3 object-storage API.
//!
//! These types are flat DTOs: they serialize exactly as the JSON bodies the
//! server exchanges, so the client and the reference server share them.

pub mod bucket;
pub mod metadata;
pub mod object;

pub use bucket::{Bucket, BucketList};
pub use metadata::ObjectMetadata;
pub use object::{ApiResult, GenerateUri, ObjectList, ObjectSummary};
