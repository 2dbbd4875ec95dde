use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to replace {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} has no file name", .path.display())]
    NoFileName { path: PathBuf },

    #[error("{} was already committed or discarded", .path.display())]
    Closed { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The underlying I/O error kind, when there is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Read { source, .. }
            | Error::Write { source, .. }
            | Error::Persist { source, .. } => Some(source.kind()),
            Error::NoFileName { .. } | Error::Closed { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::NotFound)
    }
}
