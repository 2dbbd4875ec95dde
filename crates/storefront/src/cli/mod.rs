pub mod app;

mod appstream;
mod download;
mod ratings;

use anyhow::{Context as _, Result};
use storefront_fetch::{CancellationToken, ReqwestClient};

use crate::config::StorefrontConfig;
use self::app::Commands;

/// What every command runs with.
pub struct Context {
    pub config: StorefrontConfig,
    pub client: ReqwestClient,
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(config: StorefrontConfig, cancel: CancellationToken) -> Result<Self> {
        let client = ReqwestClient::with_settings(&config.user_agent, config.timeout())
            .context("failed to build HTTP client")?;
        Ok(Self {
            config,
            client,
            cancel,
        })
    }
}

pub async fn run(cmd: Commands, ctx: &Context) -> Result<()> {
    match cmd {
        Commands::Download(arg) => download::run(arg, ctx).await,
        Commands::RefreshAppstream(arg) => appstream::run(arg, ctx).await,
        Commands::RefreshRatings(arg) => ratings::refresh(arg, ctx).await,
        Commands::Rating(arg) => ratings::show(arg, ctx).await,
    }
}
