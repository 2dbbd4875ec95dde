//! Streaming one resource into one sink with conditional-request caching.

use std::future::Future;
use std::io;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::core::{conditional_headers, parse_http_date};
use crate::data::{Progress, TransferOutcome, TransferRequest};
use crate::effects::http::{BoxStream, HttpClient, HttpResponse};
use crate::effects::sink::{OutputSink, cancelled_token};
use crate::error::{Error, Result};

/// Longest error body quoted in an HTTP error.
const MAX_ERROR_DETAIL: usize = 512;

/// Counters owned by one in-flight transfer.
#[derive(Debug, Default)]
struct TransferState {
    read: u64,
    written: u64,
    expected: u64,
}

impl TransferState {
    fn progress(&self) -> Progress {
        Progress {
            written: self.written,
            expected: self.expected,
        }
    }
}

enum Input<E> {
    Local(File),
    Remote {
        body: BoxStream<'static, std::result::Result<Bytes, E>>,
        pending: Bytes,
    },
}

impl<E: std::error::Error> Input<E> {
    /// Next chunk of at most `max` bytes; empty at end of input.
    async fn next_chunk(&mut self, uri: &str, max: usize) -> Result<Bytes> {
        match self {
            Input::Local(file) => {
                let mut buf = vec![0; max];
                let n = file
                    .read(&mut buf)
                    .await
                    .map_err(|e| Error::io(format!("reading {uri}"), e))?;
                buf.truncate(n);
                Ok(Bytes::from(buf))
            }
            Input::Remote { body, pending } => {
                while pending.is_empty() {
                    match body.next().await {
                        Some(Ok(bytes)) => *pending = bytes,
                        Some(Err(e)) => {
                            return Err(Error::Network {
                                uri: uri.to_string(),
                                message: e.to_string(),
                            });
                        }
                        None => return Ok(Bytes::new()),
                    }
                }
                let len = pending.len().min(max);
                Ok(pending.split_to(len))
            }
        }
    }
}

enum Opened<E> {
    NotModified,
    Body {
        input: Input<E>,
        expected: u64,
        etag: Option<String>,
        last_modified: Option<std::time::SystemTime>,
    },
}

/// Stream `request.uri` into `sink`.
///
/// A `file://` URI is read from disk. For `http(s)://` the request carries
/// the held validators, and a `304 Not Modified` answer ends the transfer
/// without writing anything. Either way the sink is closed before this
/// returns: normally after a download, with an already-cancelled token after
/// a failure or a not-modified answer so that nothing is committed.
///
/// Progress is reported as `(written, expected)` after every read and every
/// write, then once more at the end with `expected` settled to the number of
/// bytes actually read.
///
/// # Errors
///
/// - [`Error::InvalidUri`] when the URI cannot be parsed or has another scheme
/// - [`Error::Network`] when no response arrives or the body breaks off
/// - [`Error::Http`] for statuses other than 2xx and 304
/// - [`Error::Io`] when reading the file or writing the sink fails
/// - [`Error::Cancelled`] when `request.cancel` fires
pub async fn transfer<C, S>(
    client: &C,
    request: &TransferRequest,
    sink: &mut S,
) -> Result<TransferOutcome>
where
    C: HttpClient,
    S: OutputSink,
{
    let mut state = TransferState::default();
    debug!(uri = %request.uri, priority = %request.priority, "starting transfer");

    let opened = cancellable(&request.cancel, open(client, request)).await;
    let (input, result) = match opened {
        Ok(Opened::NotModified) => {
            debug!(uri = %request.uri, "not modified");
            let outcome = TransferOutcome::NotModified {
                etag: request.validators.etag.clone(),
                last_modified: request.validators.last_modified,
            };
            (None, Ok(outcome))
        }
        Ok(Opened::Body {
            mut input,
            expected,
            etag,
            last_modified,
        }) => {
            state.expected = expected;
            let pumped = pump(&mut input, sink, request, &mut state).await;
            let result = pumped.map(|()| TransferOutcome::Downloaded {
                etag,
                last_modified,
            });
            (Some(input), result)
        }
        Err(e) => (None, Err(e)),
    };

    finish(sink, request, &mut state, input, result).await
}

async fn open<C: HttpClient>(client: &C, request: &TransferRequest) -> Result<Opened<C::Error>> {
    let uri =
        Url::parse(&request.uri).map_err(|e| Error::invalid_uri(&request.uri, e.to_string()))?;

    match uri.scheme() {
        "file" => {
            let path = uri
                .to_file_path()
                .map_err(|()| Error::invalid_uri(&request.uri, "not a local path"))?;
            let file = File::open(&path)
                .await
                .map_err(|e| Error::io(format!("opening {}", path.display()), e))?;
            let expected = file.metadata().await.map(|m| m.len()).unwrap_or(0);

            Ok(Opened::Body {
                input: Input::Local(file),
                expected,
                etag: None,
                last_modified: None,
            })
        }
        "http" | "https" => {
            let headers = conditional_headers(&request.validators);
            let response = client
                .get(&request.uri, &headers)
                .await
                .map_err(|e| Error::Network {
                    uri: request.uri.clone(),
                    message: e.to_string(),
                })?;

            if response.is_not_modified() {
                return Ok(Opened::NotModified);
            }
            if !response.is_success() {
                return Err(http_error(&request.uri, response).await);
            }

            let last_modified = response.last_modified.as_deref().and_then(parse_http_date);
            Ok(Opened::Body {
                expected: response.content_length.unwrap_or(0),
                etag: response.etag.filter(|etag| !etag.is_empty()),
                last_modified,
                input: Input::Remote {
                    body: response.body,
                    pending: Bytes::new(),
                },
            })
        }
        scheme => Err(Error::invalid_uri(
            &request.uri,
            format!("unsupported scheme '{scheme}'"),
        )),
    }
}

/// Build the error for a rejected response, quoting the start of its body.
async fn http_error<E>(uri: &str, mut response: HttpResponse<E>) -> Error {
    let mut body = Vec::new();
    while body.len() < MAX_ERROR_DETAIL {
        match response.body.next().await {
            Some(Ok(bytes)) => body.extend_from_slice(&bytes),
            _ => break,
        }
    }
    body.truncate(MAX_ERROR_DETAIL);

    let detail = String::from_utf8_lossy(&body).trim().to_string();
    Error::Http {
        uri: uri.to_string(),
        status: response.status,
        reason: response.reason,
        detail: (!detail.is_empty()).then_some(detail),
    }
}

async fn pump<E, S>(
    input: &mut Input<E>,
    sink: &mut S,
    request: &TransferRequest,
    state: &mut TransferState,
) -> Result<()>
where
    E: std::error::Error,
    S: OutputSink,
{
    let cancel = &request.cancel;
    // An empty chunk marks the end of input, so never ask for zero bytes.
    let chunk_size = request.chunk_size.max(1);

    loop {
        let chunk = cancellable(cancel, input.next_chunk(&request.uri, chunk_size)).await?;
        if chunk.is_empty() {
            return Ok(());
        }

        state.read += chunk.len() as u64;
        state.expected = state.expected.max(state.read);
        request.report(state.progress());

        // A short write leaves the rest of the chunk to be written before
        // anything else is read.
        let mut remaining = &chunk[..];
        while !remaining.is_empty() {
            let n = cancellable(cancel, async {
                sink.write(remaining)
                    .await
                    .map_err(|e| Error::io(format!("writing output for {}", request.uri), e))
            })
            .await?;

            if n == 0 {
                return Err(Error::io(
                    format!("writing output for {}", request.uri),
                    io::ErrorKind::WriteZero.into(),
                ));
            }

            trace!(uri = %request.uri, n, "wrote chunk");
            remaining = &remaining[n..];
            state.written += n as u64;
            request.report(state.progress());
        }
    }
}

/// Final progress report, then close both ends and settle the result.
async fn finish<E, S>(
    sink: &mut S,
    request: &TransferRequest,
    state: &mut TransferState,
    input: Option<Input<E>>,
    result: Result<TransferOutcome>,
) -> Result<TransferOutcome>
where
    S: OutputSink,
{
    if result.is_ok() {
        state.expected = state.read;
    }
    request.report(state.progress());

    drop(input);

    let discard = !matches!(result, Ok(TransferOutcome::Downloaded { .. }));
    let close_token = if discard {
        cancelled_token()
    } else {
        request.cancel.clone()
    };

    match (sink.close(&close_token).await, result) {
        (Ok(()), result) => result,
        (Err(Error::Cancelled), Ok(outcome)) if discard => Ok(outcome),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(first)) => {
            if !e.is_cancelled() {
                debug!(uri = %request.uri, error = %e, "additional error closing output");
            }
            Err(first)
        }
    }
}

pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use futures_util::stream;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("mock transport error")]
    struct MockError;

    /// Serves one canned response and remembers the headers it was sent.
    struct MockClient {
        status: u16,
        etag: Option<String>,
        length: Option<u64>,
        chunks: Vec<std::result::Result<Bytes, ()>>,
        headers: Mutex<Vec<(String, String)>>,
    }

    impl MockClient {
        fn ok(chunks: Vec<Bytes>) -> Self {
            Self {
                status: 200,
                etag: Some("\"abc\"".into()),
                length: Some(chunks.iter().map(|c| c.len() as u64).sum()),
                chunks: chunks.into_iter().map(Ok).collect(),
                headers: Mutex::new(Vec::new()),
            }
        }

        fn status(status: u16) -> Self {
            Self {
                status,
                etag: None,
                length: None,
                chunks: Vec::new(),
                headers: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for MockClient {
        type Error = MockError;

        async fn get(
            &self,
            _url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<HttpResponse<MockError>, MockError> {
            *self.headers.lock().unwrap() = headers.to_vec();
            let chunks: Vec<_> = self
                .chunks
                .iter()
                .map(|c| c.clone().map_err(|()| MockError))
                .collect();
            Ok(HttpResponse {
                status: self.status,
                reason: if self.status == 404 { "Not Found".into() } else { "OK".into() },
                content_length: self.length,
                etag: self.etag.clone(),
                last_modified: Some("Sun, 06 Nov 1994 08:49:37 GMT".into()),
                body: Box::pin(stream::iter(chunks)),
            })
        }
    }

    /// Accepts at most `limit` bytes per write and records every write size.
    #[derive(Default)]
    struct ShortSink {
        limit: usize,
        data: Vec<u8>,
        writes: Vec<usize>,
        closed: Option<bool>,
    }

    impl OutputSink for ShortSink {
        async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.limit);
            self.data.extend_from_slice(&buf[..n]);
            self.writes.push(n);
            Ok(n)
        }

        async fn close(&mut self, cancel: &CancellationToken) -> Result<()> {
            self.closed = Some(cancel.is_cancelled());
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            Ok(())
        }
    }

    fn zeros(n: usize) -> Bytes {
        Bytes::from(vec![0u8; n])
    }

    fn recorder() -> (Arc<Mutex<Vec<Progress>>>, crate::data::ProgressFn) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Arc::new(move |p: &Progress| sink.lock().unwrap().push(*p)))
    }

    #[tokio::test]
    async fn downloads_and_reports_validators() {
        let client = MockClient::ok(vec![Bytes::from(vec![1u8; 500]), Bytes::from(vec![2u8; 500])]);
        let (seen, on_progress) = recorder();
        let request = TransferRequest::new("https://example.org/data").on_progress(on_progress);
        let mut sink = Vec::new();

        let outcome = transfer(&client, &request, &mut sink).await.unwrap();

        assert_eq!(outcome.etag(), Some("\"abc\""));
        assert!(outcome.last_modified().is_some());
        assert_eq!(sink.len(), 1000);
        assert_eq!(seen.lock().unwrap().last(), Some(&Progress::new(1000, 1000)));
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_bounded() {
        let client = MockClient {
            length: Some(10),
            ..MockClient::ok(vec![zeros(7), zeros(9), zeros(4)])
        };
        let (seen, on_progress) = recorder();
        let request = TransferRequest::new("https://example.org/data")
            .chunk_size(5)
            .on_progress(on_progress);
        let mut sink = ShortSink {
            limit: 3,
            ..Default::default()
        };

        transfer(&client, &request, &mut sink).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|w| w[0].written <= w[1].written));
        assert!(seen.iter().all(|p| p.written <= p.expected));
        assert_eq!(seen.last(), Some(&Progress::new(20, 20)));
    }

    #[tokio::test]
    async fn partial_writes_resume_with_remainder() {
        let client = MockClient::ok(vec![Bytes::from_static(b"abcdefgh")]);
        let request = TransferRequest::new("https://example.org/data");
        let mut sink = ShortSink {
            limit: 3,
            ..Default::default()
        };

        transfer(&client, &request, &mut sink).await.unwrap();

        assert_eq!(sink.writes, vec![3, 3, 2]);
        assert_eq!(sink.data, b"abcdefgh");
        assert_eq!(sink.closed, Some(false));
    }

    #[tokio::test]
    async fn chunks_never_exceed_chunk_size() {
        let client = MockClient::ok(vec![zeros(100)]);
        let request = TransferRequest::new("https://example.org/data").chunk_size(16);
        let mut sink = ShortSink {
            limit: usize::MAX,
            ..Default::default()
        };

        transfer(&client, &request, &mut sink).await.unwrap();

        assert!(sink.writes.iter().all(|&n| n <= 16));
        assert_eq!(sink.data.len(), 100);
    }

    #[tokio::test]
    async fn not_modified_discards_output() {
        let client = MockClient::status(304);
        let request = TransferRequest::new("https://example.org/data").etag("\"abc\"");
        let mut sink = ShortSink::default();

        let outcome = transfer(&client, &request, &mut sink).await.unwrap();

        assert_eq!(
            outcome,
            TransferOutcome::NotModified {
                etag: Some("\"abc\"".into()),
                last_modified: None,
            }
        );
        assert_eq!(sink.closed, Some(true));
        assert!(sink.writes.is_empty());
        assert_eq!(
            client.headers.lock().unwrap().as_slice(),
            &[("If-None-Match".to_string(), "\"abc\"".to_string())]
        );
    }

    #[tokio::test]
    async fn http_error_names_uri_and_reason() {
        let client = MockClient::status(404);
        let request = TransferRequest::new("https://example.org/missing");
        let mut sink = ShortSink::default();

        let err = transfer(&client, &request, &mut sink).await.unwrap_err();

        assert!(matches!(err, Error::Http { status: 404, .. }));
        assert!(err.to_string().contains("https://example.org/missing"));
        assert!(err.to_string().contains("Not Found"));
        assert_eq!(sink.closed, Some(true));
    }

    #[tokio::test]
    async fn body_failure_is_a_network_error() {
        let client = MockClient {
            chunks: vec![Ok(Bytes::from_static(b"abc")), Err(())],
            ..MockClient::ok(Vec::new())
        };
        let request = TransferRequest::new("https://example.org/data");
        let mut sink = ShortSink {
            limit: usize::MAX,
            ..Default::default()
        };

        let err = transfer(&client, &request, &mut sink).await.unwrap_err();

        assert!(matches!(err, Error::Network { .. }));
        assert_eq!(sink.closed, Some(true));
    }

    #[tokio::test]
    async fn invalid_uri_does_no_io() {
        let client = MockClient::status(200);
        let mut sink = ShortSink::default();

        let err = transfer(&client, &TransferRequest::new("not a uri"), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUri { .. }));

        let err = transfer(&client, &TransferRequest::new("ftp://example.org/x"), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUri { .. }));
        assert!(client.headers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let client = MockClient::ok(vec![Bytes::from_static(b"abc")]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = TransferRequest::new("https://example.org/data").cancel(cancel);
        let mut sink = ShortSink::default();

        let err = transfer(&client, &request, &mut sink).await.unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(sink.closed, Some(true));
        assert!(sink.data.is_empty());
    }

    #[tokio::test]
    async fn reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.txt");
        std::fs::write(&path, "local contents").unwrap();
        let uri = Url::from_file_path(&path).unwrap().to_string();

        let client = MockClient::status(500);
        let mut sink = Vec::new();
        let outcome = transfer(&client, &TransferRequest::new(uri), &mut sink).await.unwrap();

        assert_eq!(outcome.etag(), None);
        assert_eq!(sink, b"local contents");
    }

    #[tokio::test]
    async fn zero_chunk_size_still_reads_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.txt");
        std::fs::write(&path, "important contents").unwrap();
        let uri = Url::from_file_path(&path).unwrap().to_string();

        let mut request = TransferRequest::new(uri);
        request.chunk_size = 0;
        let mut sink = Vec::new();
        transfer(&MockClient::status(500), &request, &mut sink).await.unwrap();
        assert_eq!(sink, b"important contents");

        let client = MockClient::ok(vec![Bytes::from_static(b"remote")]);
        let mut request = TransferRequest::new("https://example.org/data");
        request.chunk_size = 0;
        let mut sink = Vec::new();
        transfer(&client, &request, &mut sink).await.unwrap();
        assert_eq!(sink, b"remote");
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let uri = Url::from_file_path(dir.path().join("missing")).unwrap().to_string();
        let mut sink = Vec::new();

        let err = transfer(&MockClient::status(200), &TransferRequest::new(uri), &mut sink)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
