//! Metadata-segment framing shared by get-object and put-object.
//!
//! Both directions carry the same body layout:
//!
//! ```text
//! MS3-METADATA-SIZE: N
//!
//! [ N bytes of JSON metadata ][ raw object content ... ]
//! ```
//!
//! The reader side must consume exactly `N` bytes before handing the rest of
//! the stream to the caller; chunk boundaries are arbitrary.

use axum::http::{HeaderMap, HeaderName};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, stream};
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Header carrying the byte length of the leading metadata segment.
pub const METADATA_SIZE_HEADER: HeaderName = HeaderName::from_static("ms3-metadata-size");

/// Read buffer used when forwarding object content.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Largest metadata segment either side accepts.
pub const MAX_METADATA_SEGMENT: usize = 8 * 1024 * 1024;

/// Upper bound on the up-front buffer for a metadata segment; larger
/// segments grow as chunks arrive.
const INITIAL_SEGMENT_CAPACITY: usize = 64 * 1024;

/// The split produced by [`read_metadata_segment`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSegment {
    /// Exactly the declared number of metadata bytes.
    pub metadata: Bytes,
    /// Content bytes that arrived in the same chunk as the end of the metadata.
    pub remainder: Bytes,
}

/// Parse the `MS3-METADATA-SIZE` header.
///
/// Returns `Err` with a human-readable reason when the header is missing, is
/// not a non-negative integer, or exceeds [`MAX_METADATA_SEGMENT`].
pub fn metadata_size(headers: &HeaderMap) -> Result<usize, String> {
    let value = headers
        .get(&METADATA_SIZE_HEADER)
        .ok_or_else(|| format!("missing {} header", METADATA_SIZE_HEADER))?;
    let text = value
        .to_str()
        .map_err(|_| format!("{} header is not ascii", METADATA_SIZE_HEADER))?;
    let size = text
        .trim()
        .parse::<u64>()
        .map_err(|err| format!("invalid {} header `{}`: {}", METADATA_SIZE_HEADER, text, err))?;
    match usize::try_from(size) {
        Ok(size) if size <= MAX_METADATA_SEGMENT => Ok(size),
        _ => Err(format!(
            "{} header `{}` exceeds the {} byte limit",
            METADATA_SIZE_HEADER, text, MAX_METADATA_SEGMENT
        )),
    }
}

/// Consume exactly `size` bytes of metadata from `stream`.
///
/// Loops over partial chunks until the segment is complete. Returns
/// `Ok(None)` when the stream ends before `size` bytes were seen.
pub async fn read_metadata_segment<S, E>(
    stream: &mut S,
    size: usize,
) -> Result<Option<MetadataSegment>, E>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    let mut metadata = BytesMut::with_capacity(size.min(INITIAL_SEGMENT_CAPACITY));
    let mut remainder = Bytes::new();

    while metadata.len() < size {
        let Some(chunk) = stream.next().await else {
            return Ok(None);
        };
        let mut chunk = chunk?;
        let wanted = size - metadata.len();
        if chunk.len() > wanted {
            remainder = chunk.split_off(wanted);
        }
        metadata.extend_from_slice(&chunk);
    }

    Ok(Some(MetadataSegment {
        metadata: metadata.freeze(),
        remainder,
    }))
}

/// Build the body stream for a framed upload: the metadata bytes followed by
/// `content`, forwarded chunk by chunk without buffering the whole payload.
pub fn framed_stream<R>(
    metadata: Bytes,
    content: R,
) -> impl Stream<Item = io::Result<Bytes>> + Send + Sync + 'static
where
    R: AsyncRead + Send + Sync + 'static,
{
    let head = (!metadata.is_empty()).then_some(Ok(metadata));
    stream::iter(head).chain(ReaderStream::with_capacity(content, CHUNK_SIZE))
}
