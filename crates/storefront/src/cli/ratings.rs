use std::time::Duration;

use anyhow::{Context as _, Result};
use storefront_fetch::ReqwestClient;
use storefront_ratings::{RatingsEntry, RatingsProvider};

use super::Context;
use super::app::{RatingArg, RefreshArg};
use crate::progress::{bar_callback, transfer_bar};

fn provider(ctx: &Context) -> RatingsProvider<ReqwestClient> {
    RatingsProvider::new(ctx.client.clone(), &ctx.config.review_server, &ctx.config.cache_dir)
}

pub async fn refresh(arg: RefreshArg, ctx: &Context) -> Result<()> {
    let provider = provider(ctx);
    let cache_age = if arg.force { Duration::ZERO } else { ctx.config.cache_age() };

    let bar = transfer_bar();
    let result = provider
        .refresh(cache_age, Some(bar_callback(&bar)), &ctx.cancel)
        .await;
    bar.finish_and_clear();
    result.context("failed to refresh ratings")?;

    println!("{} apps rated", provider.index().len());
    Ok(())
}

pub async fn show(arg: RatingArg, ctx: &Context) -> Result<()> {
    let provider = provider(ctx);

    if arg.any {
        let found = provider.lookup_any(arg.app_ids.iter().map(String::as_str)).await;
        let label = arg.app_ids.join(" | ");
        println!("{}", describe(&label, found.as_ref()));
        return Ok(());
    }

    for app_id in &arg.app_ids {
        let found = provider.lookup(app_id).await;
        println!("{}", describe(app_id, found.as_ref()));
    }
    Ok(())
}

fn describe(label: &str, entry: Option<&RatingsEntry>) -> String {
    match entry.and_then(|e| e.rating().map(|rating| (e, rating))) {
        Some((entry, rating)) => {
            let stars = &entry.star_counts[1..];
            format!(
                "{label}: {rating}/100 from {} ratings (1-5 stars: {stars:?})",
                entry.total()
            )
        }
        None => format!("{label}: no ratings"),
    }
}
