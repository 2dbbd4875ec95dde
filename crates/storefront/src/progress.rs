use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use storefront_fetch::{Progress, ProgressFn};

const PB_STYLE: &str = "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

pub fn transfer_bar() -> ProgressBar {
    let bar = ProgressBar::no_length();
    if let Ok(style) = ProgressStyle::with_template(PB_STYLE) {
        bar.set_style(style.tick_chars(TICK).progress_chars(PB_CHARS));
    }
    bar
}

/// Feeds transfer progress into `bar`.
pub fn bar_callback(bar: &ProgressBar) -> ProgressFn {
    let bar = bar.clone();
    Arc::new(move |progress: &Progress| {
        if progress.expected > 0 {
            bar.set_length(progress.expected);
        }
        bar.set_position(progress.written);
    })
}
