//! src/services/storage_service.rs
//!
//! StorageService — in-memory bucket and object store behind the reference
//! server. Objects keep their metadata segment exactly as uploaded so a
//! get returns the same bytes a put sent.

use crate::models::{Bucket, ObjectSummary};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt, pin_mut};
use md5::Context;
use std::{collections::BTreeMap, io, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("bucket `{0}` already exists")]
    BucketAlreadyExists(String),
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("object `{key}` not found in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, key: String },
    #[error("invalid object key")]
    InvalidObjectKey,
    #[error("metadata segment is not a json object: {0}")]
    InvalidMetadata(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A stored object: its framing metadata, its payload and bookkeeping.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub metadata: Bytes,
    pub content: Bytes,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug)]
struct BucketEntry {
    created_at: DateTime<Utc>,
    objects: BTreeMap<String, StoredObject>,
}

/// StorageService provides the operations of the MS3 API:
/// - create / list buckets
/// - list objects by `{prefix}{bucket}` path segment
/// - upload an object from a byte stream
/// - fetch an object or just its metadata
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct StorageService {
    buckets: Arc<RwLock<BTreeMap<String, BucketEntry>>>,
}

const MAX_OBJECT_KEY_LEN: usize = 1024;
const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

impl StorageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Basic key validation.
    ///
    /// Rejects empty or oversized keys and control characters.
    fn ensure_key_safe(key: &str) -> StorageResult<()> {
        if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
            return Err(StorageError::InvalidObjectKey);
        }
        if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
            return Err(StorageError::InvalidObjectKey);
        }
        Ok(())
    }

    /// Validate bucket name format.
    ///
    /// Enforces S3-like naming rules:
    /// - 3–63 characters
    /// - lowercase letters, digits, dots, hyphens only
    /// - cannot start/end with dot or hyphen
    /// - cannot contain consecutive dots or dot-hyphen patterns
    /// - cannot look like an IPv4 address
    fn ensure_bucket_name_safe(name: &str) -> StorageResult<()> {
        let invalid = |reason: &str| StorageError::InvalidBucketName {
            name: name.to_string(),
            reason: reason.into(),
        };

        let len = name.len();
        if !(BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&len) {
            return Err(invalid("must be between 3 and 63 characters"));
        }

        if !name
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
        {
            return Err(invalid(
                "allowed characters are lowercase letters, digits, dots, and hyphens",
            ));
        }

        if name.starts_with(['.', '-']) || name.ends_with(['.', '-']) {
            return Err(invalid("must start and end with a lowercase letter or digit"));
        }

        if name.contains("..") || name.contains("-.") || name.contains(".-") {
            return Err(invalid(
                "cannot contain consecutive dots or dot-hyphen combinations",
            ));
        }

        if is_ipv4_like(name) {
            return Err(invalid("must not be formatted like an IP address"));
        }

        Ok(())
    }

    /// Create an empty bucket.
    ///
    /// Returns BucketAlreadyExists if the name is taken.
    pub async fn create_bucket(&self, name: &str) -> StorageResult<Bucket> {
        Self::ensure_bucket_name_safe(name)?;
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(name) {
            return Err(StorageError::BucketAlreadyExists(name.to_string()));
        }

        let created_at = Utc::now();
        buckets.insert(
            name.to_string(),
            BucketEntry {
                created_at,
                objects: BTreeMap::new(),
            },
        );
        debug!(bucket = name, "bucket created");

        Ok(Bucket {
            name: name.to_string(),
            creation_date: Some(created_at),
        })
    }

    /// All buckets ordered by name.
    pub async fn list_buckets(&self) -> Vec<Bucket> {
        self.buckets
            .read()
            .await
            .iter()
            .map(|(name, entry)| Bucket {
                name: name.clone(),
                creation_date: Some(entry.created_at),
            })
            .collect()
    }

    /// List objects for a `{prefix}{bucket}` path segment.
    ///
    /// The bucket is the longest existing bucket name the segment ends with;
    /// whatever precedes it is treated as a key prefix.
    pub async fn list_objects(&self, segment: &str) -> StorageResult<Vec<ObjectSummary>> {
        let buckets = self.buckets.read().await;
        let (bucket, entry) = buckets
            .iter()
            .filter(|(name, _)| segment.ends_with(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .ok_or_else(|| StorageError::BucketNotFound(segment.to_string()))?;
        let prefix = &segment[..segment.len() - bucket.len()];

        Ok(entry
            .objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                bucket_name: bucket.clone(),
                key: key.clone(),
                size: object.content.len() as u64,
                last_modified: object.last_modified,
            })
            .collect())
    }

    /// Stream-upload an object.
    ///
    /// - Validates the key, the bucket and the metadata segment.
    /// - Collects the content while computing its MD5 etag.
    /// - Replaces any previous object under the same key.
    pub async fn put_object<S>(
        &self,
        bucket: &str,
        key: &str,
        metadata: Bytes,
        stream: S,
    ) -> StorageResult<StoredObject>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        Self::ensure_key_safe(key)?;
        if !metadata.is_empty() {
            serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&metadata)
                .map_err(|err| StorageError::InvalidMetadata(err.to_string()))?;
        }
        if !self.buckets.read().await.contains_key(bucket) {
            return Err(StorageError::BucketNotFound(bucket.to_string()));
        }

        let mut content = BytesMut::new();
        let mut digest = Context::new();
        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            digest.consume(&chunk);
            content.extend_from_slice(&chunk);
        }

        let object = StoredObject {
            metadata,
            content: content.freeze(),
            etag: format!("{:x}", digest.compute()),
            last_modified: Utc::now(),
        };

        let mut buckets = self.buckets.write().await;
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        entry.objects.insert(key.to_string(), object.clone());
        debug!(
            bucket,
            key,
            size = object.content.len(),
            metadata_len = object.metadata.len(),
            "object stored"
        );

        Ok(object)
    }

    /// Fetch an object for reading.
    pub async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        Self::ensure_key_safe(key)?;
        let buckets = self.buckets.read().await;
        let entry = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        entry
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

/// Check if a string matches IPv4-like dotted decimal form.
/// Rejects names formatted like `1.2.3.4`.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|segment| {
            !segment.is_empty()
                && segment.len() <= 3
                && segment.chars().all(|c| c.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}
