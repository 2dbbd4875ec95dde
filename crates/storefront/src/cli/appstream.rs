use std::time::Duration;

use anyhow::{Context as _, Result};
use storefront_fetch::ExternalAppstream;
use tracing::info;

use super::Context;
use super::app::RefreshArg;
use crate::progress::{bar_callback, transfer_bar};

pub async fn run(arg: RefreshArg, ctx: &Context) -> Result<()> {
    let appstream = ExternalAppstream::new(ctx.client.clone(), ctx.config.appstream_dir())
        .urls(ctx.config.appstream_urls.iter().cloned());
    if !appstream.has_urls() {
        info!("no external AppStream URLs configured");
        return Ok(());
    }

    let cache_age = if arg.force { Duration::ZERO } else { ctx.config.cache_age() };
    let bar = transfer_bar();
    let result = appstream
        .refresh(cache_age, Some(bar_callback(&bar)), &ctx.cancel)
        .await;
    bar.finish_and_clear();

    for path in result.context("failed to refresh external AppStream files")? {
        println!("{}", path.display());
    }
    Ok(())
}
