//! Keeping the ratings index in step with the review server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use storefront_fetch::{HttpClient, IoPriority, ProgressFn, TransferRequest, transfer_to_file};
use storefront_fs::{SidecarValidators, file_age};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::entry::RatingsEntry;
use crate::error::{Error, Result};
use crate::index::RatingsIndex;

/// Subdirectory of the cache directory holding the ratings document.
pub const RATINGS_CACHE_SUBDIR: &str = "ratings";
pub const RATINGS_FILE_NAME: &str = "ratings.json";

/// Fetches the ratings document and serves lookups from it.
pub struct RatingsProvider<C> {
    client: C,
    review_server: String,
    cache_path: PathBuf,
    index: RatingsIndex,
}

impl<C: HttpClient> RatingsProvider<C> {
    pub fn new(client: C, review_server: impl Into<String>, cache_dir: impl AsRef<Path>) -> Self {
        Self {
            client,
            review_server: review_server.into(),
            cache_path: cache_dir
                .as_ref()
                .join(RATINGS_CACHE_SUBDIR)
                .join(RATINGS_FILE_NAME),
            index: RatingsIndex::new(),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn index(&self) -> &RatingsIndex {
        &self.index
    }

    /// URL of the ratings document on the review server.
    pub fn ratings_url(&self) -> String {
        format!("{}/ratings", self.review_server.trim_end_matches('/'))
    }

    pub async fn lookup(&self, app_id: &str) -> Option<RatingsEntry> {
        self.ensure_loaded().await;
        self.index.lookup(app_id)
    }

    /// Look up the first of several ids the same app may be known by.
    pub async fn lookup_any<'a, I>(&self, app_ids: I) -> Option<RatingsEntry>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.ensure_loaded().await;
        self.index.lookup_any(app_ids)
    }

    /// Bring the index up to date.
    ///
    /// A cached document younger than `cache_age` is reloaded as is;
    /// otherwise it is revalidated against the review server first. An
    /// unparsable cached document is deleted.
    pub async fn refresh(
        &self,
        cache_age: Duration,
        on_progress: Option<ProgressFn>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if !cache_age.is_zero() {
            let age = file_age(&self.cache_path);
            if age < cache_age {
                debug!(
                    path = %self.cache_path.display(),
                    age_secs = age.as_secs(),
                    "ratings cache is fresh"
                );
                return self.load_cache().await;
            }
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let url = self.ratings_url();
        let mut request = TransferRequest::new(&url)
            .priority(IoPriority::Low)
            .cancel(cancel.clone());
        if let Some(on_progress) = on_progress {
            request = request.on_progress(on_progress);
        }

        let outcome = transfer_to_file(&self.client, &SidecarValidators, request, &self.cache_path)
            .await
            .inspect_err(|e| warn!(%url, error = %e, "failed to download ratings"))?;
        info!(%url, not_modified = outcome.is_not_modified(), "ratings refreshed");

        self.load_cache().await
    }

    async fn ensure_loaded(&self) {
        if self.index.is_loaded() {
            return;
        }
        if let Err(e) = self.load_cache().await {
            debug!(error = %e, "no ratings available");
        }
    }

    async fn load_cache(&self) -> Result<()> {
        match self.index.load_file(&self.cache_path).await {
            Ok(count) => {
                debug!(count, path = %self.cache_path.display(), "loaded ratings");
                Ok(())
            }
            Err(e @ Error::Parse(_)) => {
                warn!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "removing unparsable ratings cache"
                );
                if let Err(remove) = tokio::fs::remove_file(&self.cache_path).await {
                    debug!(error = %remove, "failed to remove ratings cache");
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
