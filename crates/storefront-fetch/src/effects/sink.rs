use std::future::Future;
use std::io;

use storefront_fs::ReplaceFile;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Destination of a transfer.
///
/// `close` is always called exactly once at the end of a transfer. When the
/// token passed to it is already cancelled the sink must not commit what it
/// received; it returns [`Error::Cancelled`] instead.
pub trait OutputSink: Send {
    /// Accept some prefix of `buf` and return its length.
    fn write(&mut self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    fn close(&mut self, cancel: &CancellationToken) -> impl Future<Output = Result<()>> + Send;
}

impl OutputSink for Vec<u8> {
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn close(&mut self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

impl OutputSink for ReplaceFile {
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ReplaceFile::write(self, buf).await
    }

    async fn close(&mut self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            self.discard().await?;
            return Err(Error::Cancelled);
        }
        self.commit().await?;
        Ok(())
    }
}

/// A token that is already cancelled, for closing a sink without committing.
pub(crate) fn cancelled_token() -> CancellationToken {
    let token = CancellationToken::new();
    token.cancel();
    token
}
