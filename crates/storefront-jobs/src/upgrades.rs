//! Listing the distribution releases the system can upgrade to.

use std::sync::Arc;

use storefront_fetch::FanOut;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::plugin::{Action, App, ListDistroUpgradesOptions, Plugin, RefineOptions, supporting};
use crate::version::compare_versions;

#[derive(Clone)]
pub struct ListDistroUpgradesJob {
    plugins: Vec<Arc<dyn Plugin>>,
    options: ListDistroUpgradesOptions,
}

impl ListDistroUpgradesJob {
    pub fn new(plugins: Vec<Arc<dyn Plugin>>, options: ListDistroUpgradesOptions) -> Self {
        Self { plugins, options }
    }

    /// Collect upgrades from every supporting plugin, refine them and sort
    /// them oldest first.
    ///
    /// The first plugin error fails the job; results from the other plugins
    /// are dropped then. Without any supporting plugin the list is empty.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<Vec<App>> {
        let mut fan_out: FanOut<'_, Vec<App>, Error> = FanOut::new(cancel.clone());
        for plugin in supporting(&self.plugins, Action::ListDistroUpgrades) {
            if !fan_out.launch(plugin.list_distro_upgrades(&self.options, cancel)) {
                break;
            }
        }
        if fan_out.launched() == 0 {
            debug!("no plugin could list distro upgrades");
        }

        let mut upgrades = fan_out
            .join(Vec::new(), |all, mut found| all.append(&mut found))
            .await?;

        if !upgrades.is_empty() {
            let options = RefineOptions {
                require_setup_action: true,
                disable_filtering: true,
                ..self.options.refine
            };
            refine(&self.plugins, &mut upgrades, &options, cancel).await?;
        }

        upgrades.sort_by(|a, b| compare_versions(&a.version, &b.version));
        Ok(upgrades)
    }
}

/// Let every supporting plugin refine `apps`, one after the other.
pub async fn refine(
    plugins: &[Arc<dyn Plugin>],
    apps: &mut [App],
    options: &RefineOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    for plugin in supporting(plugins, Action::Refine) {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        plugin.refine(apps, options, cancel).await?;
        debug!(plugin = plugin.name(), count = apps.len(), "refined apps");
    }
    Ok(())
}
