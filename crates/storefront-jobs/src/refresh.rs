//! Refreshing every metadata source in one operation.

use std::fmt;
use std::sync::Arc;

use storefront_fetch::{Blend, FanOut, PROGRESS_PERIOD, Progress, ProgressAggregator, ProgressSlot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::plugin::{Action, Plugin, RefreshMetadataOptions, supporting};
use crate::source::RefreshSource;

/// Callback receiving the overall completion as a whole percentage.
pub type PercentFn = Arc<dyn Fn(u32) + Send + Sync>;

/// Refreshes external AppStream files, every plugin's metadata and the
/// ratings in parallel.
///
/// A failing source is logged and does not fail the job. The job fails
/// when no plugin can refresh at all, or when it is cancelled before every
/// plugin was started.
pub struct RefreshMetadataJob {
    plugins: Vec<Arc<dyn Plugin>>,
    appstream: Option<Arc<dyn RefreshSource>>,
    ratings: Option<Arc<dyn RefreshSource>>,
    options: RefreshMetadataOptions,
    on_percentage: Option<PercentFn>,
}

impl fmt::Debug for RefreshMetadataJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshMetadataJob")
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("appstream", &self.appstream.is_some())
            .field("ratings", &self.ratings.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RefreshMetadataJob {
    pub fn new(plugins: Vec<Arc<dyn Plugin>>, options: RefreshMetadataOptions) -> Self {
        Self {
            plugins,
            appstream: None,
            ratings: None,
            options,
            on_percentage: None,
        }
    }

    #[must_use]
    pub fn appstream(mut self, source: Arc<dyn RefreshSource>) -> Self {
        self.appstream = Some(source);
        self
    }

    #[must_use]
    pub fn ratings(mut self, source: Arc<dyn RefreshSource>) -> Self {
        self.ratings = Some(source);
        self
    }

    #[must_use]
    pub fn on_percentage(mut self, on_percentage: PercentFn) -> Self {
        self.on_percentage = Some(on_percentage);
        self
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        let mut aggregator = ProgressAggregator::new(Blend::Portions);
        if let Some(on_percentage) = self.on_percentage.clone() {
            aggregator = aggregator.on_report(Arc::new(move |p: &Progress| {
                on_percentage(p.percentage())
            }));
        }

        let mut fan_out: FanOut<'_, (), Error> = FanOut::new(cancel.clone());

        if let Some(source) = &self.appstream {
            if !cancel.is_cancelled() {
                let slot = aggregator.slot();
                fan_out.launch(refresh_source(source.as_ref(), self.options, slot, cancel));
            }
        }

        let mut any_plugins_ran = false;
        for plugin in supporting(&self.plugins, Action::RefreshMetadata) {
            any_plugins_ran = true;
            if cancel.is_cancelled() {
                fan_out.record(Error::Cancelled);
                break;
            }

            let slot = aggregator.completion_slot();
            let options = &self.options;
            fan_out.launch(async move {
                let result = plugin.refresh_metadata(options, cancel).await;
                slot.complete();
                match result {
                    Ok(()) => debug!(plugin = plugin.name(), "plugin metadata refreshed"),
                    Err(e) => {
                        debug!(plugin = plugin.name(), error = %e, "failed to refresh metadata")
                    }
                }
                Ok(())
            });
        }

        if let Some(source) = &self.ratings {
            if !cancel.is_cancelled() {
                let slot = aggregator.slot();
                fan_out.launch(refresh_source(source.as_ref(), self.options, slot, cancel));
            }
        }

        if !any_plugins_ran {
            fan_out.record(Error::NotSupported("no plugin could handle refreshing".to_string()));
        }

        let children = fan_out.launched();
        fan_out
            .join_reporting((), |_, ()| {}, aggregator, PROGRESS_PERIOD)
            .await?;
        info!(children, "metadata refresh finished");
        Ok(())
    }
}

async fn refresh_source(
    source: &dyn RefreshSource,
    options: RefreshMetadataOptions,
    slot: ProgressSlot,
    cancel: &CancellationToken,
) -> Result<()> {
    let result = source.refresh(options.cache_age, slot.callback(), cancel).await;
    slot.complete();
    if let Err(e) = result {
        debug!(source = source.name(), error = %e, "failed to refresh");
    }
    Ok(())
}
