//! HTTP handlers for the MS3 bucket and object endpoints.
//! Object bodies are framed as `[metadata segment][content]`, with the
//! segment length in the `MS3-METADATA-SIZE` header, in both directions.

use crate::{
    errors::AppError,
    framing::{self, CHUNK_SIZE, METADATA_SIZE_HEADER},
    models::{ApiResult, BucketList, GenerateUri, ObjectList},
    paths,
    services::storage_service::StorageService,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::{StreamExt, stream};
use std::io;
use tracing::debug;

/// `GET /api/buckets/list`
pub async fn list_buckets(State(service): State<StorageService>) -> Json<BucketList> {
    Json(BucketList {
        list: service.list_buckets().await,
    })
}

/// `PUT /api/buckets/create/{bucket}`
pub async fn create_bucket(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let created = service.create_bucket(&bucket).await?;
    Ok(Json(ApiResult {
        bucket_name: Some(created.name),
        creation_time: created.creation_date,
        ..ApiResult::default()
    }))
}

/// `GET /api/bucket/list/{*segment}` — the segment is `{prefix}{bucket}`.
pub async fn list_objects(
    State(service): State<StorageService>,
    Path(segment): Path<String>,
) -> Result<Json<ObjectList>, AppError> {
    let list = service.list_objects(&segment).await?;
    Ok(Json(ObjectList { list }))
}

/// `GET /api/bucket/metadata/{bucket}/{*key}` — the stored metadata segment
/// as JSON, `{}` when the object was uploaded without one.
pub async fn get_metadata(
    State(service): State<StorageService>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let object = service.get_object(&bucket, &key).await?;
    let body = if object.metadata.is_empty() {
        Bytes::from_static(b"{}")
    } else {
        object.metadata
    };

    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

/// `GET /api/bucket/object/{bucket}/{*key}` — metadata segment then content,
/// streamed in chunks.
pub async fn get_object(
    State(service): State<StorageService>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let object = service.get_object(&bucket, &key).await?;
    let metadata_len = object.metadata.len();

    let mut chunks = vec![object.metadata];
    chunks.extend(split_chunks(object.content, CHUNK_SIZE));
    let body_stream = stream::iter(
        chunks
            .into_iter()
            .filter(|chunk| !chunk.is_empty())
            .map(Ok::<_, io::Error>),
    );

    let mut response = Response::new(Body::from_stream(body_stream));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(METADATA_SIZE_HEADER, HeaderValue::from(metadata_len));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", object.etag)) {
        headers.insert(header::ETAG, value);
    }

    Ok(response)
}

/// `PUT /api/bucket/object/{bucket}/{*key}` — splits the framed body and
/// stores metadata and content.
pub async fn put_object(
    State(service): State<StorageService>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ApiResult>, AppError> {
    let metadata_size = framing::metadata_size(&headers).map_err(AppError::bad_request)?;

    let mut body_stream = body.into_data_stream();
    let segment = framing::read_metadata_segment(&mut body_stream, metadata_size)
        .await
        .map_err(|err| AppError::bad_request(format!("failed to read request body: {}", err)))?
        .ok_or_else(|| AppError::bad_request("request body shorter than its metadata segment"))?;
    debug!(%bucket, %key, metadata_size, "receiving object");

    let content = stream::iter((!segment.remainder.is_empty()).then_some(Ok(segment.remainder)))
        .chain(body_stream.map(|chunk| chunk.map_err(io::Error::other)));
    let object = service
        .put_object(&bucket, &key, segment.metadata, content)
        .await?;

    Ok(Json(ApiResult {
        etag: Some(object.etag),
        ..ApiResult::default()
    }))
}

/// `GET /api/bucket/generateuri/{bucket}/{*key}` — a server-relative URI the
/// object can be downloaded from.
pub async fn generate_uri(
    State(service): State<StorageService>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Json<GenerateUri>, AppError> {
    service.get_object(&bucket, &key).await?;
    Ok(Json(GenerateUri {
        uri: paths::object_path("object", &bucket, &key),
    }))
}

fn split_chunks(data: Bytes, size: usize) -> Vec<Bytes> {
    (0..data.len())
        .step_by(size.max(1))
        .map(|start| data.slice(start..(start + size).min(data.len())))
        .collect()
}
