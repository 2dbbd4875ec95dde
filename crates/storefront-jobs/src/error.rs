use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("plugin '{plugin}' failed: {message}")]
    Plugin { plugin: String, message: String },

    #[error(transparent)]
    Fetch(storefront_fetch::Error),

    #[error(transparent)]
    Ratings(storefront_ratings::Error),

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("operation was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, Error::NotSupported(_))
    }
}

impl From<storefront_fetch::Error> for Error {
    fn from(err: storefront_fetch::Error) -> Self {
        match err {
            storefront_fetch::Error::Cancelled => Error::Cancelled,
            storefront_fetch::Error::NotSupported(what) => Error::NotSupported(what),
            other => Error::Fetch(other),
        }
    }
}

impl From<storefront_ratings::Error> for Error {
    fn from(err: storefront_ratings::Error) -> Self {
        match err {
            storefront_ratings::Error::Cancelled => Error::Cancelled,
            other => Error::Ratings(other),
        }
    }
}
