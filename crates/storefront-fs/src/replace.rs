use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{Error, Result};

/// A file that replaces `destination` only when committed.
///
/// Bytes are written to a private temporary file created next to the
/// destination. [`ReplaceFile::commit`] renames it over the destination;
/// [`ReplaceFile::discard`] (or dropping the value) removes it and leaves the
/// destination as it was.
#[derive(Debug)]
pub struct ReplaceFile {
    destination: PathBuf,
    staging: Option<(File, TempPath)>,
}

impl ReplaceFile {
    pub async fn create(destination: impl AsRef<Path>) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let file_name = destination
            .file_name()
            .ok_or_else(|| Error::NoFileName {
                path: destination.clone(),
            })?
            .to_string_lossy()
            .into_owned();

        let parent = crate::parent_dir(&destination).to_path_buf();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&format!(".{file_name}."))
                .suffix(".tmp")
                .tempfile_in(parent)
        })
        .await
        .map_err(|e| Error::Write {
            path: destination.clone(),
            source: io::Error::other(e),
        })?
        .map_err(|e| Error::Write {
            path: destination.clone(),
            source: e,
        })?;

        let (file, temp) = named.into_parts();
        debug!(
            destination = %destination.display(),
            staging = %temp.display(),
            "staging replacement"
        );

        Ok(Self {
            destination,
            staging: Some((File::from_std(file), temp)),
        })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Path of the temporary file, while it exists.
    pub fn staging_path(&self) -> Option<&Path> {
        self.staging.as_ref().map(|(_, temp)| temp.as_ref())
    }

    pub fn is_closed(&self) -> bool {
        self.staging.is_none()
    }

    /// Write some prefix of `buf`, returning how many bytes were accepted.
    pub async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.staging.as_mut() {
            Some((file, _)) => file.write(buf).await,
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "replacement file already closed",
            )),
        }
    }

    /// Flush the staged bytes and atomically move them over the destination.
    pub async fn commit(&mut self) -> Result<()> {
        let (mut file, temp) = self.take()?;
        let write_err = |source| Error::Write {
            path: temp.to_path_buf(),
            source,
        };

        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        let destination = self.destination.clone();
        tokio::task::spawn_blocking(move || temp.persist(&destination))
            .await
            .map_err(|e| Error::Persist {
                path: self.destination.clone(),
                source: io::Error::other(e),
            })?
            .map_err(|e| Error::Persist {
                path: self.destination.clone(),
                source: e.error,
            })?;

        debug!(destination = %self.destination.display(), "committed replacement");
        Ok(())
    }

    /// Remove the staged bytes; the destination is left untouched.
    pub async fn discard(&mut self) -> Result<()> {
        let (file, temp) = self.take()?;
        drop(file);

        let path = temp.to_path_buf();
        tokio::task::spawn_blocking(move || temp.close())
            .await
            .map_err(|e| Error::Write {
                path: path.clone(),
                source: io::Error::other(e),
            })?
            .map_err(|e| Error::Write {
                path: path.clone(),
                source: e,
            })?;

        debug!(destination = %self.destination.display(), "discarded replacement");
        Ok(())
    }

    fn take(&mut self) -> Result<(File, TempPath)> {
        self.staging.take().ok_or_else(|| Error::Closed {
            path: self.destination.clone(),
        })
    }
}
