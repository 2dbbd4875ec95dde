//! Keeping locally cached copies of external AppStream files up to date.

use std::path::{Path, PathBuf};
use std::time::Duration;

use storefront_fs::{SidecarValidators, ValidatorStore, file_age};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{cache_basename, is_allowed_appstream_url};
use crate::data::{IoPriority, ProgressFn, TransferRequest};
use crate::effects::aggregator::{Blend, ProgressAggregator};
use crate::effects::fan_out::{FanOut, PROGRESS_PERIOD};
use crate::effects::file::transfer_to_file;
use crate::effects::http::HttpClient;
use crate::error::{Error, Result};

/// A set of external AppStream URLs and the directory their copies live in.
pub struct ExternalAppstream<C, V = SidecarValidators> {
    client: C,
    validators: V,
    urls: Vec<String>,
    cache_dir: PathBuf,
}

impl<C: HttpClient> ExternalAppstream<C> {
    pub fn new(client: C, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            validators: SidecarValidators,
            urls: Vec::new(),
            cache_dir: cache_dir.into(),
        }
    }
}

impl<C, V> ExternalAppstream<C, V>
where
    C: HttpClient,
    V: ValidatorStore,
{
    pub fn with_validators<W: ValidatorStore>(self, validators: W) -> ExternalAppstream<C, W> {
        ExternalAppstream {
            client: self.client,
            validators,
            urls: self.urls,
            cache_dir: self.cache_dir,
        }
    }

    #[must_use]
    pub fn urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_urls(&self) -> bool {
        !self.urls.is_empty()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the copy of `url` is kept.
    pub fn cache_path(&self, url: &str) -> Result<PathBuf> {
        Ok(self.cache_dir.join(cache_basename(url)?))
    }

    /// Download every configured file whose copy is older than `cache_age`.
    ///
    /// URLs that are neither HTTPS nor on `localhost` are skipped with a
    /// warning. Returns the copy paths of all accepted URLs, in configuration
    /// order, including those that were fresh enough to skip. `on_progress`
    /// receives summed byte counts every [`PROGRESS_PERIOD`].
    pub async fn refresh(
        &self,
        cache_age: Duration,
        on_progress: Option<ProgressFn>,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        let mut aggregator = ProgressAggregator::new(Blend::Bytes);
        if let Some(on_progress) = on_progress {
            aggregator = aggregator.on_report(on_progress);
        }

        let mut fan_out: FanOut<'_, ()> = FanOut::new(cancel.clone());
        let mut paths = Vec::with_capacity(self.urls.len());

        for url in &self.urls {
            if !is_allowed_appstream_url(url) {
                warn!(url = %url, "ignoring external AppStream URL that is not HTTPS");
                continue;
            }

            let target = match self.cache_path(url) {
                Ok(target) => target,
                Err(e) => {
                    fan_out.record(e);
                    continue;
                }
            };
            paths.push(target.clone());

            if file_age(&target) < cache_age {
                debug!(url = %url, path = %target.display(), "external AppStream copy is fresh");
                continue;
            }

            let slot = aggregator.slot();
            let request = TransferRequest::new(url.as_str())
                .priority(IoPriority::Low)
                .on_progress(slot.callback())
                .cancel(cancel.clone());

            let launched = fan_out.launch(async move {
                let result =
                    transfer_to_file(&self.client, &self.validators, request, &target).await;
                slot.complete();
                match result {
                    Ok(outcome) => {
                        info!(
                            url = %url,
                            not_modified = outcome.is_not_modified(),
                            "refreshed external AppStream file"
                        );
                        Ok(())
                    }
                    Err(Error::Cancelled) => Err(Error::Cancelled),
                    Err(e) => Err(Error::ExternalAppstream {
                        url: url.clone(),
                        source: Box::new(e),
                    }),
                }
            });
            if !launched {
                break;
            }
        }

        fan_out
            .join_reporting((), |_, ()| {}, aggregator, PROGRESS_PERIOD)
            .await?;
        Ok(paths)
    }
}
