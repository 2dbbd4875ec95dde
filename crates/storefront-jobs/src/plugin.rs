//! The boundary between the jobs and the software sources that back them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Operations a plugin may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    RefreshMetadata,
    ListDistroUpgrades,
    Refine,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::RefreshMetadata => "refresh-metadata",
            Action::ListDistroUpgrades => "list-distro-upgrades",
            Action::Refine => "refine",
        };
        f.write_str(name)
    }
}

/// An installable item as far as the jobs are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct App {
    pub id: String,
    pub version: String,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub management_plugin: Option<String>,
}

impl App {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn management_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.management_plugin = Some(plugin.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshMetadataOptions {
    /// Sources whose copy is younger than this are not re-downloaded.
    pub cache_age: Duration,
    pub interactive: bool,
}

impl RefreshMetadataOptions {
    pub fn new(cache_age: Duration) -> Self {
        Self {
            cache_age,
            interactive: false,
        }
    }

    #[must_use]
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }
}

/// What a refine pass should fill in or relax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefineOptions {
    pub require_setup_action: bool,
    pub disable_filtering: bool,
    pub interactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListDistroUpgradesOptions {
    pub interactive: bool,
    /// Base options for the refine pass run over the found upgrades.
    pub refine: RefineOptions,
}

/// A software source the jobs can drive.
///
/// Every operation defaults to [`Error::NotSupported`]; a plugin overrides
/// the ones it reports through [`Plugin::supports`].
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Disabled plugins are skipped by every job.
    fn enabled(&self) -> bool {
        true
    }

    fn supports(&self, action: Action) -> bool;

    async fn refresh_metadata(
        &self,
        _options: &RefreshMetadataOptions,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        Err(not_supported(self.name(), Action::RefreshMetadata))
    }

    async fn list_distro_upgrades(
        &self,
        _options: &ListDistroUpgradesOptions,
        _cancel: &CancellationToken,
    ) -> Result<Vec<App>> {
        Err(not_supported(self.name(), Action::ListDistroUpgrades))
    }

    async fn refine(
        &self,
        _apps: &mut [App],
        _options: &RefineOptions,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        Err(not_supported(self.name(), Action::Refine))
    }
}

fn not_supported(plugin: &str, action: Action) -> Error {
    Error::NotSupported(format!("plugin '{plugin}' does not implement {action}"))
}

/// Enabled plugins that support `action`, in registration order.
pub(crate) fn supporting(
    plugins: &[Arc<dyn Plugin>],
    action: Action,
) -> impl Iterator<Item = &Arc<dyn Plugin>> {
    plugins
        .iter()
        .filter(move |plugin| plugin.enabled() && plugin.supports(action))
}
