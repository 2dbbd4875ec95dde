use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse ratings: {0}")]
    Parse(String),

    #[error("failed to download ratings: {0}")]
    Download(#[source] storefront_fetch::Error),

    #[error("failed to read ratings from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("operation was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<storefront_fetch::Error> for Error {
    fn from(err: storefront_fetch::Error) -> Self {
        if err.is_cancelled() {
            Error::Cancelled
        } else {
            Error::Download(err)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
