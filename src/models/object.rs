//! Represents objects stored in a bucket and the small result bodies the
//! object endpoints return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of an object listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    /// Bucket that holds the object.
    pub bucket_name: String,

    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Size of the content in bytes. Missing means 0.
    #[serde(default)]
    pub size: u64,

    /// Last modification time, epoch milliseconds on the wire. Missing means
    /// the epoch.
    #[serde(default, with = "chrono::serde::ts_milliseconds")]
    pub last_modified: DateTime<Utc>,
}

/// Body of `GET api/bucket/list/{prefix+bucket}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ObjectList {
    #[serde(default)]
    pub list: Vec<ObjectSummary>,
}

/// Body of `GET api/bucket/generateuri/{bucket}/{key}`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenerateUri {
    /// Relative or absolute URI, resolved against the server URL.
    pub uri: String,
}

/// Generic result object returned by mutating endpoints (create bucket,
/// put object). Every field is optional; servers may return an empty body.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub creation_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
