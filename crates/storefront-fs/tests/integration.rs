use std::time::Duration;

use storefront_fs::{
    AtomicWriteOptions, ReplaceFile, SidecarValidators, ValidatorStore, atomic_read, atomic_write,
    file_age,
};
use tempfile::tempdir;

#[test]
fn test_atomic_write_preserves_content_on_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("existing.txt");
    std::fs::write(&path, "original").unwrap();

    let missing_parent = dir.path().join("missing").join("file.txt");
    assert!(atomic_write(&missing_parent, b"new", AtomicWriteOptions::new()).is_err());
    assert_eq!(atomic_read(&path).unwrap(), b"original");
}

#[tokio::test]
async fn test_replace_then_record_validators() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("appstream.xml");

    let mut file = ReplaceFile::create(&dest).await.unwrap();
    let mut remaining: &[u8] = b"<components/>";
    while !remaining.is_empty() {
        let n = file.write(remaining).await.unwrap();
        remaining = &remaining[n..];
    }
    file.commit().await.unwrap();
    SidecarValidators.store_etag(&dest, Some("\"v1\"")).unwrap();

    let validators = SidecarValidators.load(&dest);
    assert_eq!(validators.etag.as_deref(), Some("\"v1\""));
    assert!(file_age(&dest) < Duration::from_secs(60));
    assert_eq!(atomic_read(&dest).unwrap(), b"<components/>");
}

#[tokio::test]
async fn test_discarded_replacement_keeps_validators() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("appstream.xml");
    std::fs::write(&dest, "cached").unwrap();
    SidecarValidators.store_etag(&dest, Some("\"v1\"")).unwrap();

    let mut file = ReplaceFile::create(&dest).await.unwrap();
    file.write(b"ignored").await.unwrap();
    file.discard().await.unwrap();

    assert_eq!(atomic_read(&dest).unwrap(), b"cached");
    assert_eq!(SidecarValidators.load(&dest).etag.as_deref(), Some("\"v1\""));
}
