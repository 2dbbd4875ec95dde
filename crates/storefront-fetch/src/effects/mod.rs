mod aggregator;
mod appstream;
mod css;
mod fan_out;
mod file;
mod http;
mod sink;
mod transfer;

pub use aggregator::{Blend, ProgressAggregator, ProgressSlot};
pub use appstream::ExternalAppstream;
pub use css::{CSS_CACHE_SUBDIR, CssRewriteOptions, DATADIR_PLACEHOLDER, rewrite_resource};
pub use fan_out::{FanOut, PROGRESS_PERIOD};
pub use file::transfer_to_file;
pub use http::{BoxStream, HttpClient, HttpResponse};
pub use sink::OutputSink;
pub use transfer::transfer;

#[cfg(feature = "reqwest")]
pub use http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ReqwestClient};
