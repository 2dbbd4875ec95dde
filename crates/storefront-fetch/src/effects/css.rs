//! Localizing the resources a stylesheet refers to.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use storefront_fs::ValidatorStore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::{cache_basename, css_urls};
use crate::data::{IoPriority, TransferRequest};
use crate::effects::fan_out::FanOut;
use crate::effects::file::transfer_to_file;
use crate::effects::http::HttpClient;
use crate::error::{Error, Result};

/// Placeholder replaced by [`CssRewriteOptions::data_dir`].
pub const DATADIR_PLACEHOLDER: &str = "@datadir@";

/// Subdirectory of the cache directory holding downloaded stylesheet resources.
pub const CSS_CACHE_SUBDIR: &str = "cssresource";

#[derive(Debug, Clone)]
pub struct CssRewriteOptions {
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl CssRewriteOptions {
    pub fn new(data_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }
}

/// Rewrite every `url(...)` in `resource` to point at a local file.
///
/// Absolute paths (optionally `file://`) must exist and are used in place.
/// Anything else is downloaded into the `cssresource` cache, unless a copy is
/// already there. Every reference becomes `'file://<path>'`.
///
/// # Errors
///
/// The first error among a missing local file and the downloads; the
/// rewritten text is only returned when all downloads succeeded.
pub async fn rewrite_resource<C, V>(
    client: &C,
    validators: &V,
    resource: &str,
    options: &CssRewriteOptions,
    cancel: &CancellationToken,
) -> Result<String>
where
    C: HttpClient,
    V: ValidatorStore,
{
    let resource = resource.replace(DATADIR_PLACEHOLDER, &options.data_dir.to_string_lossy());
    let cache_dir = options.cache_dir.join(CSS_CACHE_SUBDIR);
    let mut rewritten = String::with_capacity(resource.len());
    let mut fan_out: FanOut<'_, ()> = FanOut::new(cancel.clone());
    let mut copied = 0;

    for url in css_urls(&resource) {
        rewritten.push_str(&resource[copied..url.span.start]);
        copied = url.span.end;

        let target = url.target.strip_prefix("file://").unwrap_or(url.target);
        let local_path = if target.starts_with('/') {
            let path = PathBuf::from(target);
            if !path.exists() {
                fan_out.record(Error::io(
                    format!("failed to find file {target}"),
                    io::ErrorKind::NotFound.into(),
                ));
                break;
            }
            path
        } else {
            let path = match cache_basename(target) {
                Ok(name) => cache_dir.join(name),
                Err(e) => {
                    fan_out.record(e);
                    break;
                }
            };

            if !path.exists()
                && !launch_download(&mut fan_out, client, validators, target, &path, cancel)
            {
                break;
            }
            path
        };

        let _ = write!(rewritten, "'file://{}'", local_path.display());
    }
    rewritten.push_str(&resource[copied..]);

    fan_out.join((), |_, ()| {}).await?;
    Ok(rewritten)
}

fn launch_download<'a, C, V>(
    fan_out: &mut FanOut<'a, ()>,
    client: &'a C,
    validators: &'a V,
    uri: &str,
    path: &Path,
    cancel: &CancellationToken,
) -> bool
where
    C: HttpClient,
    V: ValidatorStore,
{
    debug!(uri, path = %path.display(), "downloading stylesheet resource");
    let request = TransferRequest::new(uri)
        .priority(IoPriority::Low)
        .cancel(cancel.clone());
    let path = path.to_path_buf();

    fan_out.launch(async move {
        transfer_to_file(client, validators, request, &path)
            .await
            .map(|_| ())
    })
}
