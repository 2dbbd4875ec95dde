use std::fmt;
use std::time::SystemTime;

use storefront_fs::Validators;
use tokio_util::sync::CancellationToken;

use super::progress::{Progress, ProgressFn};

/// Default number of bytes read per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Scheduling hint for a transfer.
///
/// Transfers are not reordered by priority; the value is carried into log
/// records so that background refreshes can be told apart from user requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoPriority {
    Low,
    #[default]
    Default,
    High,
}

impl fmt::Display for IoPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoPriority::Low => write!(f, "low"),
            IoPriority::Default => write!(f, "default"),
            IoPriority::High => write!(f, "high"),
        }
    }
}

/// Everything needed to move one resource into one sink.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use storefront_fetch::{IoPriority, TransferRequest};
///
/// let request = TransferRequest::new("https://example.org/ratings")
///     .etag("\"abc\"")
///     .priority(IoPriority::Low)
///     .on_progress(Arc::new(|progress| {
///         println!("{}/{}", progress.written, progress.expected);
///     }));
/// assert_eq!(request.validators.etag.as_deref(), Some("\"abc\""));
/// ```
#[derive(Clone)]
pub struct TransferRequest {
    /// `file://`, `http://` or `https://` URI of the resource.
    pub uri: String,

    /// Validators of the copy the caller already holds.
    ///
    /// When an ETag is present only `If-None-Match` is sent; otherwise a
    /// Last-Modified date is sent as `If-Modified-Since`.
    pub validators: Validators,

    pub priority: IoPriority,

    /// Upper bound on the bytes read (and so buffered) per step.
    ///
    /// Default: 8192
    pub chunk_size: usize,

    /// Invoked after every read and every write, and once more when the
    /// transfer finishes.
    pub on_progress: Option<ProgressFn>,

    pub cancel: CancellationToken,
}

impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("uri", &self.uri)
            .field("validators", &self.validators)
            .field("priority", &self.priority)
            .field("chunk_size", &self.chunk_size)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl TransferRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            validators: Validators::default(),
            priority: IoPriority::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_progress: None,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }

    /// Set the ETag of the held copy. Empty strings count as no ETag.
    #[must_use]
    pub fn etag(mut self, etag: impl Into<String>) -> Self {
        self.validators = self.validators.etag(etag);
        self
    }

    #[must_use]
    pub fn last_modified(mut self, last_modified: SystemTime) -> Self {
        self.validators = self.validators.last_modified(last_modified);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: IoPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the chunk size; zero is treated as one byte.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    #[must_use]
    pub fn cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn report(&self, progress: Progress) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(&progress);
        }
    }
}
