//! HTTP client for the MS3 object-storage API.
//!
//! Every operation is a single HTTP exchange against `{server_url}api/...`
//! with JSON bodies. Status codes 200–399 count as success; anything else is
//! reported as [`ClientError::Protocol`] carrying the status and raw body.
//! Object get/put frame the payload as a metadata segment followed by raw
//! content (see [`crate::framing`]).

mod builder;
mod content;
mod waiters;

pub use builder::{ClientBuilder, DEFAULT_SERVER_URL_ENV};
pub use content::{ObjectContent, ObjectHandle};
pub use waiters::{WaiterConfig, Waiters};

use crate::{
    errors::{ClientError, ClientResult},
    framing::{self, METADATA_SIZE_HEADER},
    models::{ApiResult, Bucket, BucketList, GenerateUri, ObjectList, ObjectMetadata, ObjectSummary},
    paths::{encode_path, object_path},
};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use reqwest::{
    Method, Response, StatusCode, Url,
    header::{ACCEPT, HeaderValue},
};
use serde::de::DeserializeOwned;
use std::{io, path::Path, sync::OnceLock};
use tokio::{
    fs::{self, File},
    io::{AsyncRead, AsyncWriteExt},
};
use tracing::{debug, warn};

const MEDIA_TYPE_JSON: &str = "application/json";
const MEDIA_TYPE_ANY: &str = "*/*";

/// Outcome of a successful put-object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutResult {
    /// Entity tag reported by the server, if any.
    pub etag: Option<String>,
    /// The metadata that was sent with the object.
    pub metadata: Option<ObjectMetadata>,
}

/// Client for a single MS3 server.
///
/// Cheap to share: wrap it in an `Arc` and call it from as many tasks as
/// needed. The only state written after construction is the lazily built
/// [`Waiters`] helper.
#[derive(Debug)]
pub struct ObjectStoreClient {
    server_url: Url,
    http: reqwest::Client,
    waiter_config: WaiterConfig,
    waiters: OnceLock<Waiters>,
}

/// A decoded response: the status plus the body, absent when the server sent
/// nothing.
struct ApiResponse<T> {
    status: u16,
    body: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_required(self, operation: &str) -> ClientResult<T> {
        self.body.ok_or_else(|| {
            ClientError::protocol(self.status, format!("{}: empty response body", operation), "")
        })
    }
}

impl ObjectStoreClient {
    pub(crate) fn new(server_url: Url, http: reqwest::Client, waiter_config: WaiterConfig) -> Self {
        Self {
            server_url,
            http,
            waiter_config,
            waiters: OnceLock::new(),
        }
    }

    /// A builder seeded from the environment; see [`ClientBuilder::standard`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::standard()
    }

    /// A client for the default server URL taken from `MS3_SERVER_URL`.
    pub fn default_client() -> ClientResult<Self> {
        ClientBuilder::standard().build()
    }

    /// Base URL every API path is appended to. Always ends with `/`.
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// The polling helper, constructed on first use.
    pub fn waiters(&self) -> &Waiters {
        self.waiters
            .get_or_init(|| Waiters::new(self.waiter_config))
    }

    /// `GET api/buckets/list` — all buckets, in server order.
    pub async fn list_buckets(&self) -> ClientResult<Vec<Bucket>> {
        let reply: ApiResponse<BucketList> = self
            .call(Method::GET, "api/buckets/list", "list buckets")
            .await?;
        Ok(reply.into_required("list buckets")?.list)
    }

    /// `PUT api/buckets/create/{name}`.
    ///
    /// The creation time is filled in when the server reports one.
    pub async fn create_bucket(&self, name: &str) -> ClientResult<Bucket> {
        let path = format!("api/buckets/create/{}", encode_path(name));
        let reply: ApiResponse<ApiResult> = self.call(Method::PUT, &path, "create bucket").await?;

        let result = reply.body.unwrap_or_default();
        Ok(Bucket {
            name: result.bucket_name.unwrap_or_else(|| name.to_string()),
            creation_date: result.creation_time,
        })
    }

    /// `GET api/bucket/list/{prefix}{bucket}` — objects of a bucket.
    ///
    /// The prefix is glued in front of the bucket name in the path segment,
    /// which is how MS3 servers expect it; it is not sent as a query filter.
    /// Reserved characters in either part are percent-encoded.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> ClientResult<Vec<ObjectSummary>> {
        let segment = format!("{}{}", prefix.unwrap_or(""), bucket);
        let path = format!("api/bucket/list/{}", encode_path(&segment));
        let reply: ApiResponse<ObjectList> = self.call(Method::GET, &path, "list objects").await?;
        Ok(reply.into_required("list objects")?.list)
    }

    /// `GET api/bucket/metadata/{bucket}/{key}`.
    pub async fn get_object_metadata(&self, bucket: &str, key: &str) -> ClientResult<ObjectMetadata> {
        let path = object_path("metadata", bucket, key);
        let reply: ApiResponse<ObjectMetadata> =
            self.call(Method::GET, &path, "get object metadata").await?;
        Ok(reply.body.unwrap_or_default())
    }

    /// `GET api/bucket/object/{bucket}/{key}`.
    ///
    /// Reads the metadata segment announced by `MS3-METADATA-SIZE` and returns
    /// the rest of the body as an open stream owned by the caller. On any
    /// error the response is dropped, which releases the connection.
    pub async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<ObjectHandle> {
        let url = self.endpoint(&object_path("object", bucket, key))?;
        debug!(%url, "get object");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, MEDIA_TYPE_ANY)
            .send()
            .await?;
        let response = ensure_success(response, "get object").await?;
        let status = response.status().as_u16();

        let metadata_size = framing::metadata_size(response.headers())
            .map_err(|reason| ClientError::protocol(status, reason, ""))?;

        let mut body = response.bytes_stream().map_err(io::Error::other).boxed();
        let segment = framing::read_metadata_segment(&mut body, metadata_size)
            .await?
            .ok_or_else(|| {
                ClientError::protocol(
                    status,
                    format!("response ended inside a {} byte metadata segment", metadata_size),
                    "",
                )
            })?;

        let metadata = ObjectMetadata::from_slice(&segment.metadata).map_err(|err| {
            ClientError::protocol(
                status,
                format!("malformed metadata segment: {}", err),
                String::from_utf8_lossy(&segment.metadata),
            )
        })?;

        Ok(ObjectHandle::new(
            bucket,
            key,
            metadata,
            ObjectContent::new(segment.remainder, body),
        ))
    }

    /// `PUT api/bucket/object/{bucket}/{key}`.
    ///
    /// The body is the encoded metadata followed by `content`, streamed
    /// chunk by chunk with no declared length.
    pub async fn put_object<R>(
        &self,
        bucket: &str,
        key: &str,
        content: R,
        metadata: Option<&ObjectMetadata>,
    ) -> ClientResult<PutResult>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        let url = self.endpoint(&object_path("object", bucket, key))?;
        let metadata_bin = match metadata {
            Some(metadata) => metadata.to_vec().map_err(ClientError::Encode)?,
            None => Vec::new(),
        };
        debug!(%url, metadata_len = metadata_bin.len(), "put object");

        let response = self
            .http
            .put(url)
            .header(ACCEPT, MEDIA_TYPE_JSON)
            .header(METADATA_SIZE_HEADER, HeaderValue::from(metadata_bin.len()))
            .body(reqwest::Body::wrap_stream(framing::framed_stream(
                Bytes::from(metadata_bin),
                content,
            )))
            .send()
            .await?;
        let reply: ApiResponse<ApiResult> = decode(response, "put object").await?;

        Ok(PutResult {
            etag: reply.body.and_then(|result| result.etag),
            metadata: metadata.cloned(),
        })
    }

    /// Upload a string as `text/plain`, with its byte length recorded in the
    /// metadata.
    pub async fn put_object_from_str(
        &self,
        bucket: &str,
        key: &str,
        content: &str,
    ) -> ClientResult<PutResult> {
        let bytes = content.as_bytes().to_vec();
        let mut metadata = ObjectMetadata::new();
        metadata.set_content_type("text/plain");
        metadata.set_content_length(bytes.len() as u64);

        self.put_object(bucket, key, io::Cursor::new(bytes), Some(&metadata))
            .await
    }

    /// Upload a local file, streaming it from disk.
    pub async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        path: impl AsRef<Path>,
        metadata: Option<&ObjectMetadata>,
    ) -> ClientResult<PutResult> {
        let file = File::open(path.as_ref()).await?;
        self.put_object(bucket, key, file, metadata).await
    }

    /// Download an object's content as UTF-8 text.
    pub async fn get_object_as_string(&self, bucket: &str, key: &str) -> ClientResult<String> {
        let bytes = self.get_object(bucket, key).await?.into_content().bytes().await?;
        String::from_utf8(bytes)
            .map_err(|err| ClientError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }

    /// Download an object into `destination`, returning its metadata.
    ///
    /// A partially written file is removed when the transfer fails.
    pub async fn get_object_to_file(
        &self,
        bucket: &str,
        key: &str,
        destination: impl AsRef<Path>,
    ) -> ClientResult<ObjectMetadata> {
        let destination = destination.as_ref();
        let (metadata, mut content) = self.get_object(bucket, key).await?.into_parts();

        let mut file = File::create(destination).await?;
        let written = async {
            let copied = tokio::io::copy(&mut content, &mut file).await?;
            file.flush().await?;
            Ok::<_, io::Error>(copied)
        }
        .await;
        let copied = match written {
            Ok(copied) => copied,
            Err(err) => {
                drop(file);
                let _ = fs::remove_file(destination).await;
                return Err(ClientError::Io(err));
            }
        };
        debug!(path = %destination.display(), copied, "object written to file");

        Ok(metadata)
    }

    /// `GET api/bucket/generateuri/{bucket}/{key}`, resolved against the server
    /// URL.
    ///
    /// Unlike every other operation this one never fails: any error is logged
    /// at `warn` and reported as `None`. Use [`Self::try_access_url`] to see
    /// the error.
    pub async fn get_access_url(&self, bucket: &str, key: &str) -> Option<Url> {
        match self.try_access_url(bucket, key).await {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(bucket, key, error = %err, "could not obtain access url, returning none");
                None
            }
        }
    }

    /// Like [`Self::get_access_url`] but reports failures.
    pub async fn try_access_url(&self, bucket: &str, key: &str) -> ClientResult<Url> {
        let reply: ApiResponse<GenerateUri> = self
            .call(Method::GET, &object_path("generateuri", bucket, key), "generate access url")
            .await?;
        let status = reply.status;
        let uri = reply.into_required("generate access url")?.uri;

        self.server_url.join(&uri).map_err(|err| {
            ClientError::protocol(status, format!("unusable uri in response: {}", err), uri.clone())
        })
    }

    /// Poll list-buckets until `name` shows up.
    pub async fn wait_until_bucket_exists(&self, name: &str) -> ClientResult<()> {
        self.waiters()
            .poll_until(&format!("bucket `{}`", name), move || async move {
                let buckets = self.list_buckets().await?;
                Ok(buckets.iter().any(|bucket| bucket.name == name))
            })
            .await
    }

    /// Poll get-metadata until the object exists. Client errors (4xx) count as
    /// "not yet"; anything else aborts the wait.
    pub async fn wait_until_object_exists(&self, bucket: &str, key: &str) -> ClientResult<()> {
        self.waiters()
            .poll_until(&format!("object `{}/{}`", bucket, key), move || async move {
                match self.get_object_metadata(bucket, key).await {
                    Ok(_) => Ok(true),
                    Err(err) if err.status().is_some_and(|s| (400..500).contains(&s)) => Ok(false),
                    Err(err) => Err(err),
                }
            })
            .await
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let raw = format!("{}{}", self.server_url, path);
        Url::parse(&raw).map_err(|err| ClientError::InvalidUrl(format!("`{}`: {}", raw, err)))
    }

    /// Send a bodiless JSON request and decode the JSON reply.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        operation: &str,
    ) -> ClientResult<ApiResponse<T>> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, operation, "sending request");

        let response = self
            .http
            .request(method, url)
            .header(ACCEPT, MEDIA_TYPE_JSON)
            .send()
            .await?;
        decode(response, operation).await
    }
}

fn is_success(status: StatusCode) -> bool {
    (200..400).contains(&status.as_u16())
}

/// Reject responses outside the success range, keeping the body for
/// diagnostics.
async fn ensure_success(response: Response, operation: &str) -> ClientResult<Response> {
    let status = response.status();
    if is_success(status) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(operation, status = status.as_u16(), %body, "request rejected");
    Err(ClientError::protocol(
        status.as_u16(),
        format!("{} failed", operation),
        body,
    ))
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    operation: &str,
) -> ClientResult<ApiResponse<T>> {
    let response = ensure_success(response, operation).await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?;
    if body.is_empty() {
        return Ok(ApiResponse { status, body: None });
    }

    match serde_json::from_slice(&body) {
        Ok(value) => Ok(ApiResponse {
            status,
            body: Some(value),
        }),
        Err(err) => Err(ClientError::protocol(
            status,
            format!("{}: malformed response body: {}", operation, err),
            String::from_utf8_lossy(&body),
        )),
    }
}
