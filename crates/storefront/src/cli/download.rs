use anyhow::{Context as _, Result};
use storefront_fetch::{TransferOutcome, TransferRequest, transfer_to_file};
use storefront_fs::SidecarValidators;

use super::Context;
use super::app::DownloadArg;
use crate::progress::{bar_callback, transfer_bar};

pub async fn run(arg: DownloadArg, ctx: &Context) -> Result<()> {
    let bar = transfer_bar();
    let request = TransferRequest::new(&arg.uri)
        .chunk_size(ctx.config.chunk_size)
        .on_progress(bar_callback(&bar))
        .cancel(ctx.cancel.clone());

    let result = transfer_to_file(&ctx.client, &SidecarValidators, request, &arg.dest).await;
    bar.finish_and_clear();

    let outcome = result.with_context(|| format!("failed to download {}", arg.uri))?;
    match &outcome {
        TransferOutcome::Downloaded { .. } => println!("downloaded {}", arg.dest.display()),
        TransferOutcome::NotModified { .. } => println!("{} is up to date", arg.dest.display()),
    }
    if let Some(etag) = outcome.etag() {
        println!("etag: {etag}");
    }
    Ok(())
}
