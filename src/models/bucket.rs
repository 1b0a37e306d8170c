//! Represents a logical bucket — a top-level container for objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A storage bucket as reported by the MS3 server.
///
/// On the wire a bucket is `{ "bucketName": ..., "creationTime": <epoch millis> }`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    /// Bucket name.
    #[serde(rename = "bucketName")]
    pub name: String,

    /// When this bucket was created. `None` when the server did not say.
    #[serde(
        rename = "creationTime",
        default,
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub creation_date: Option<DateTime<Utc>>,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: None,
        }
    }
}

/// Body of `GET api/buckets/list`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BucketList {
    #[serde(default)]
    pub list: Vec<Bucket>,
}
