//! Downloaded metadata that is refreshed alongside the plugins.

use std::time::Duration;

use async_trait::async_trait;
use storefront_fetch::{ExternalAppstream, HttpClient, ProgressFn};
use storefront_fs::ValidatorStore;
use storefront_ratings::RatingsProvider;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// A cached download refreshed by [`crate::RefreshMetadataJob`].
#[async_trait]
pub trait RefreshSource: Send + Sync {
    fn name(&self) -> &str;

    /// Bring the cached copy up to date, reporting bytes to `on_progress`.
    async fn refresh(
        &self,
        cache_age: Duration,
        on_progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

#[async_trait]
impl<C, V> RefreshSource for ExternalAppstream<C, V>
where
    C: HttpClient,
    V: ValidatorStore,
{
    fn name(&self) -> &str {
        "external-appstream"
    }

    async fn refresh(
        &self,
        cache_age: Duration,
        on_progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ExternalAppstream::refresh(self, cache_age, Some(on_progress), cancel).await?;
        Ok(())
    }
}

#[async_trait]
impl<C: HttpClient> RefreshSource for RatingsProvider<C> {
    fn name(&self) -> &str {
        "ratings"
    }

    async fn refresh(
        &self,
        cache_age: Duration,
        on_progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<()> {
        RatingsProvider::refresh(self, cache_age, Some(on_progress), cancel).await?;
        Ok(())
    }
}
