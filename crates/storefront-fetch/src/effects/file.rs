//! Conditional downloads into locally cached files.

use std::path::Path;

use storefront_fs::{ReplaceFile, ValidatorStore};
use tracing::debug;

use crate::data::{TransferOutcome, TransferRequest};
use crate::effects::http::HttpClient;
use crate::effects::transfer::transfer;
use crate::error::{Error, Result};

/// Refresh the cached copy of `request.uri` at `destination`.
///
/// The validators remembered for `destination` replace any set on
/// `request`. The destination is replaced atomically and only when the
/// server sent a new body; after a failure or a not-modified answer the old
/// copy is left in place. On success the server's ETag is remembered for
/// next time.
pub async fn transfer_to_file<C, V>(
    client: &C,
    validators: &V,
    request: TransferRequest,
    destination: &Path,
) -> Result<TransferOutcome>
where
    C: HttpClient,
    V: ValidatorStore,
{
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io(format!("creating {}", parent.display()), e))?;
    }

    let request = request.validators(validators.load(destination));
    let mut sink = ReplaceFile::create(destination).await?;
    let outcome = transfer(client, &request, &mut sink).await?;

    validators.store_etag(destination, outcome.etag())?;
    debug!(
        uri = %request.uri,
        destination = %destination.display(),
        not_modified = outcome.is_not_modified(),
        "cached copy is current"
    );

    Ok(outcome)
}
