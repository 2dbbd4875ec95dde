//! Star ratings for store apps.
//!
//! The review server publishes one JSON document with per-app star
//! histograms. [`RatingsProvider`] keeps a cached copy of it up to date and
//! answers lookups from a [`RatingsIndex`], a sorted snapshot that is swapped
//! wholesale on every refresh.
//!
//! ```no_run
//! # async fn demo() -> storefront_ratings::Result<()> {
//! use std::time::Duration;
//!
//! use storefront_fetch::{CancellationToken, ReqwestClient};
//! use storefront_ratings::RatingsProvider;
//!
//! let client = ReqwestClient::new()?;
//! let server = "https://odrs.gnome.org/1.0/reviews/api";
//! let provider = RatingsProvider::new(client, server, "/tmp/cache");
//! provider.refresh(Duration::from_secs(86_400), None, &CancellationToken::new()).await?;
//!
//! if let Some(entry) = provider.lookup("org.gnome.Maps").await {
//!     println!("{:?}", entry.rating());
//! }
//! # Ok(())
//! # }
//! ```

mod entry;
mod error;
mod index;
mod provider;
mod wilson;

pub use entry::{RatingsEntry, parse_ratings};
pub use error::{Error, Result};
pub use index::{RatingsIndex, Snapshot};
pub use provider::{RATINGS_CACHE_SUBDIR, RATINGS_FILE_NAME, RatingsProvider};
pub use wilson::{DEFAULT_POWER, pnormaldist, wilson_rating, wilson_score};
