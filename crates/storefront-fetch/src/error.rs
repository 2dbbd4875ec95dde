//! Error types for storefront-fetch.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("failed to download '{uri}': {reason}{}", detail_suffix(.detail))]
    Http {
        uri: String,
        status: u16,
        reason: String,
        detail: Option<String>,
    },

    #[error("failed to download '{uri}': {message}")]
    Network { uri: String, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("operation was cancelled")]
    Cancelled,

    #[error("{0}")]
    NotSupported(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("server returned no data for external AppStream file '{url}': {source}")]
    ExternalAppstream {
        url: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Fs(#[from] storefront_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// HTTP status of a rejected response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::ExternalAppstream { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            Error::Fs(e) => e.is_not_found(),
            Error::ExternalAppstream { source, .. } => source.is_not_found(),
            _ => self.status() == Some(404),
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_message_includes_detail() {
        let err = Error::Http {
            uri: "https://example.org/a".into(),
            status: 500,
            reason: "Internal Server Error".into(),
            detail: Some("database offline".into()),
        };
        assert_eq!(
            err.to_string(),
            "failed to download 'https://example.org/a': Internal Server Error: database offline"
        );
    }

    #[test]
    fn http_error_message_without_detail() {
        let err = Error::Http {
            uri: "https://example.org/a".into(),
            status: 404,
            reason: "Not Found".into(),
            detail: None,
        };
        assert_eq!(err.to_string(), "failed to download 'https://example.org/a': Not Found");
        assert!(err.is_not_found());
    }
}
