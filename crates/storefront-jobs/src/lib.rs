//! Store-level jobs that fan work out to plugins and cached sources.
//!
//! - [`RefreshMetadataJob`]: refresh external AppStream files, plugin
//!   metadata and ratings together, reporting one overall percentage
//! - [`ListDistroUpgradesJob`]: gather, refine and order distribution
//!   upgrades
//!
//! Plugins sit behind the [`Plugin`] trait; downloaded sources behind
//! [`RefreshSource`], which `storefront_fetch::ExternalAppstream` and
//! `storefront_ratings::RatingsProvider` implement.

mod error;
mod plugin;
mod refresh;
mod source;
mod upgrades;
mod version;

pub use error::{Error, Result};
pub use plugin::{
    Action, App, ListDistroUpgradesOptions, Plugin, RefineOptions, RefreshMetadataOptions,
};
pub use refresh::{PercentFn, RefreshMetadataJob};
pub use source::RefreshSource;
pub use upgrades::{ListDistroUpgradesJob, refine};
pub use version::compare_versions;
