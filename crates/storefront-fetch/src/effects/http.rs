use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// The parts of a GET response the transfer engine looks at.
///
/// Empty `ETag` and `Last-Modified` header values are reported as `None`.
pub struct HttpResponse<E> {
    pub status: u16,
    /// Reason phrase for `status`, e.g. `Not Found`.
    pub reason: String,
    pub content_length: Option<u64>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

impl<E> HttpResponse<E> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }
}

impl<E> fmt::Debug for HttpResponse<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("content_length", &self.content_length)
            .field("etag", &self.etag)
            .field("last_modified", &self.last_modified)
            .finish_non_exhaustive()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface needed for conditional
/// downloads. Implementations handle their own redirect following, timeout
/// configuration and TLS; a response with any status is returned as `Ok`.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a GET for `url` with the extra `headers`.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received (DNS failure,
    /// connection refused, timeout, ...). HTTP error statuses are reported
    /// through [`HttpResponse::status`].
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

impl<C: HttpClient> HttpClient for Arc<C> {
    type Error = C::Error;

    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = std::result::Result<HttpResponse<Self::Error>, Self::Error>> + Send {
        (**self).get(url, headers)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use reqwest::header::{ETAG, HeaderName, LAST_MODIFIED};

    use super::*;
    use crate::error::{Error, Result};

    pub const DEFAULT_USER_AGENT: &str = concat!("storefront/", env!("CARGO_PKG_VERSION"));
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Production HTTP client implementation using reqwest.
    ///
    /// Cloning is cheap; clones share one connection pool.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Client with the default user agent and a 10 second connect timeout.
        pub fn new() -> Result<Self> {
            Self::with_settings(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
        }

        pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self> {
            let client = reqwest::Client::builder()
                .user_agent(user_agent)
                .connect_timeout(timeout)
                .build()
                .map_err(|e| Error::ClientBuild(e.to_string()))?;
            Ok(Self { client })
        }

        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<HttpResponse<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);

            for (key, value) in headers {
                request = request.header(key.as_str(), value.as_str());
            }

            let response = request.send().await?;
            let header = |name: HeaderName| {
                response
                    .headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .filter(|value| !value.is_empty())
                    .map(str::to_owned)
            };

            let status = response.status();
            let etag = header(ETAG);
            let last_modified = header(LAST_MODIFIED);
            let content_length = response.content_length();

            Ok(HttpResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                content_length,
                etag,
                last_modified,
                body: Box::pin(response.bytes_stream()),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ReqwestClient};
