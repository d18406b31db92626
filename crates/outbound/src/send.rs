//! Send abstraction and the pre-serialised buffer implementation

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// A payload that knows how to write itself to an outbound channel
#[async_trait]
pub trait Outbound {
    /// Write the payload to `out`.
    ///
    /// I/O failures are returned unchanged; nothing is retried.
    async fn write_to<W>(&self, out: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin + Send;
}

/// An already serialised buffer, written as is
#[derive(Debug, Clone)]
pub struct BufferedSend {
    buf: Bytes,
}

impl BufferedSend {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.buf
    }
}

#[async_trait]
impl Outbound for BufferedSend {
    async fn write_to<W>(&self, out: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        out.write_all(&self.buf).await?;
        trace!(bytes = self.buf.len(), "Buffered send written");
        Ok(())
    }
}
