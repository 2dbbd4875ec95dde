//! Conditional HTTP transfers and multi-source refresh orchestration.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Requests, outcomes and progress values
//! - [`core`] - Pure transformations (conditional headers, cache names, CSS scanning)
//! - `effects` - I/O operations behind the [`HttpClient`] and [`OutputSink`] seams
//!
//! # Key Features
//!
//! - **Conditional**: `If-None-Match` / `If-Modified-Since` turn unchanged
//!   resources into [`TransferOutcome::NotModified`] without touching the
//!   destination
//! - **Atomic Placement**: cached files are replaced through
//!   `storefront_fs::ReplaceFile`, so a failed transfer leaves the old copy
//! - **Fan-Out**: [`FanOut`] runs independent children under one parent and
//!   completes exactly once; [`ProgressAggregator`] folds their progress
//! - **Mechanism-Only**: no retries; a failure is reported once and the next
//!   refresh cycle tries again

pub mod core;
pub mod data;
mod effects;
mod error;

pub use data::{
    DEFAULT_CHUNK_SIZE, IoPriority, Progress, ProgressFn, TransferOutcome, TransferRequest,
};
pub use effects::{
    Blend, BoxStream, CSS_CACHE_SUBDIR, CssRewriteOptions, DATADIR_PLACEHOLDER, ExternalAppstream,
    FanOut, HttpClient, HttpResponse, OutputSink, PROGRESS_PERIOD, ProgressAggregator,
    ProgressSlot, rewrite_resource, transfer, transfer_to_file,
};

#[cfg(feature = "reqwest")]
pub use effects::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ReqwestClient};

pub use error::{Error, Result};
pub use tokio_util::sync::CancellationToken;
