mod cli;
mod config;
mod logging;
mod progress;

use anyhow::{Context as _, Result};
use clap::Parser;
use storefront_fetch::CancellationToken;
use tracing::{debug, warn};

use crate::cli::Context;
use crate::cli::app::App;
use crate::config::StorefrontConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();

    let config =
        StorefrontConfig::load(app.config.as_deref()).context("failed to load configuration")?;
    logging::init_logging(app.log_level.as_deref().unwrap_or(&config.log_level))?;
    debug!(?config, "configuration loaded");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let ctx = Context::new(config, cancel)?;
    cli::run(app.cmd, &ctx).await
}
