//! Object content handed to callers of get-object.

use crate::models::ObjectMetadata;
use bytes::Bytes;
use futures::{Stream, StreamExt, stream, stream::BoxStream};
use std::{
    fmt, io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio_util::io::StreamReader;

/// The still-open content stream of a downloaded object.
///
/// Holds the underlying HTTP connection until it is read to the end or
/// dropped; dropping it early releases the connection.
pub struct ObjectContent {
    reader: StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>,
}

impl ObjectContent {
    /// `head` holds content bytes already pulled off the wire while reading
    /// the metadata segment; `rest` is the remaining response body.
    pub(crate) fn new<S>(head: Bytes, rest: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        let head = (!head.is_empty()).then_some(Ok(head));
        let stream = stream::iter(head).chain(rest).boxed();
        Self {
            reader: StreamReader::new(stream),
        }
    }

    /// Read the whole remaining content into memory.
    pub async fn bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

impl AsyncRead for ObjectContent {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

impl fmt::Debug for ObjectContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectContent").finish_non_exhaustive()
    }
}

/// An object returned by get-object: its address, its metadata, and the
/// caller-owned content stream.
#[derive(Debug)]
pub struct ObjectHandle {
    pub bucket_name: String,
    pub key: String,
    pub metadata: ObjectMetadata,
    content: ObjectContent,
}

impl ObjectHandle {
    pub(crate) fn new(
        bucket_name: impl Into<String>,
        key: impl Into<String>,
        metadata: ObjectMetadata,
        content: ObjectContent,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            key: key.into(),
            metadata,
            content,
        }
    }

    pub fn content(&mut self) -> &mut ObjectContent {
        &mut self.content
    }

    pub fn into_content(self) -> ObjectContent {
        self.content
    }

    pub fn into_parts(self) -> (ObjectMetadata, ObjectContent) {
        (self.metadata, self.content)
    }
}
