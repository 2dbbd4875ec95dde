use std::sync::{Arc, Mutex};

use httpmock::prelude::*;
use storefront_fetch::{
    CancellationToken, Error, Progress, ReqwestClient, TransferOutcome, TransferRequest,
    transfer_to_file,
};
use storefront_fs::{SidecarValidators, ValidatorStore};
use tempfile::tempdir;

fn recorder() -> (Arc<Mutex<Vec<Progress>>>, storefront_fetch::ProgressFn) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, Arc::new(move |p: &Progress| sink.lock().unwrap().push(*p)))
}

#[tokio::test]
async fn fresh_download_then_not_modified() {
    let server = MockServer::start_async().await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("cache").join("ratings.json");
    let client = ReqwestClient::new().unwrap();
    let body = vec![b'x'; 1000];

    let mut download = server.mock(|when, then| {
        when.method(GET).path("/ratings");
        then.status(200).header("ETag", "\"abc\"").body(&body);
    });

    let (seen, on_progress) = recorder();
    let request = TransferRequest::new(server.url("/ratings"))
        .chunk_size(500)
        .on_progress(on_progress);
    let outcome = transfer_to_file(&client, &SidecarValidators, request, &dest)
        .await
        .unwrap();

    download.assert();
    assert!(matches!(outcome, TransferOutcome::Downloaded { .. }));
    assert_eq!(outcome.etag(), Some("\"abc\""));
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert_eq!(seen.lock().unwrap().last(), Some(&Progress::new(1000, 1000)));
    assert_eq!(SidecarValidators.load(&dest).etag.as_deref(), Some("\"abc\""));

    download.delete();
    let revalidate = server.mock(|when, then| {
        when.method(GET)
            .path("/ratings")
            .header("If-None-Match", "\"abc\"");
        then.status(304);
    });

    let outcome = transfer_to_file(
        &client,
        &SidecarValidators,
        TransferRequest::new(server.url("/ratings")),
        &dest,
    )
    .await
    .unwrap();

    revalidate.assert();
    assert!(outcome.is_not_modified());
    assert_eq!(outcome.etag(), Some("\"abc\""));
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert_eq!(SidecarValidators.load(&dest).etag.as_deref(), Some("\"abc\""));
}

#[tokio::test]
async fn failed_download_keeps_previous_copy() {
    let server = MockServer::start_async().await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("ratings.json");
    std::fs::write(&dest, "previous").unwrap();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/ratings");
        then.status(503).body("try later");
    });

    let err = transfer_to_file(
        &ReqwestClient::new().unwrap(),
        &SidecarValidators,
        TransferRequest::new(server.url("/ratings")),
        &dest,
    )
    .await
    .unwrap_err();

    mock.assert();
    assert!(matches!(err, Error::Http { status: 503, .. }));
    assert!(err.to_string().contains("try later"));
    assert_eq!(std::fs::read(&dest).unwrap(), b"previous");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn modification_date_used_without_etag() {
    let server = MockServer::start_async().await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("apps.xml");
    std::fs::write(&dest, "<components/>").unwrap();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/apps.xml").header_exists("If-Modified-Since");
        then.status(304);
    });

    let outcome = transfer_to_file(
        &ReqwestClient::new().unwrap(),
        &SidecarValidators,
        TransferRequest::new(server.url("/apps.xml")),
        &dest,
    )
    .await
    .unwrap();

    mock.assert();
    assert!(outcome.is_not_modified());
    assert_eq!(std::fs::read(&dest).unwrap(), b"<components/>");
}

#[tokio::test]
async fn cancelled_mid_transfer_keeps_previous_copy() {
    let server = MockServer::start_async().await;
    let dir = tempdir().unwrap();
    let dest = dir.path().join("ratings.json");
    std::fs::write(&dest, "previous").unwrap();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/ratings");
        then.status(200).header("ETag", "\"new\"").body(vec![b'x'; 100_000]);
    });

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let request = TransferRequest::new(server.url("/ratings"))
        .chunk_size(10)
        .cancel(cancel)
        .on_progress(Arc::new(move |p: &Progress| {
            if p.written > 50 {
                trigger.cancel();
            }
        }));

    let err = transfer_to_file(&ReqwestClient::new().unwrap(), &SidecarValidators, request, &dest)
        .await
        .unwrap_err();

    mock.assert();
    assert!(err.is_cancelled());
    assert_eq!(std::fs::read(&dest).unwrap(), b"previous");
    assert_eq!(SidecarValidators.load(&dest).etag, None);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
