use std::{
    io::SeekFrom,
    pin::Pin,
    task::{Context, Poll},
};
use tempfile::{NamedTempFile, TempPath};
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWriteExt, ReadBuf};

use crate::FetchError;

/// A stream over a local temporary copy of a fetched resource. The temporary
/// file is deleted when the stream is dropped.
#[derive(Debug)]
pub struct SpooledFile {
    file: tokio::fs::File,
    length: u64,
    _path: TempPath,
}

impl SpooledFile {
    /// Copy `reader` to the end into a new temporary file, and rewind
    pub async fn spool<R>(mut reader: R) -> Result<Self, FetchError>
    where
        R: AsyncRead + Unpin,
    {
        let (file, path) = NamedTempFile::new()?.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let length = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        file.seek(SeekFrom::Start(0)).await?;

        trace!("Spooled {} bytes to {}", length, path.display());

        Ok(SpooledFile {
            file,
            length,
            _path: path,
        })
    }

    /// Number of bytes that were spooled
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl AsyncRead for SpooledFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}
