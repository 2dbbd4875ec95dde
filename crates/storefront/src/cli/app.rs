use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(
    name = "storefront",
    version = env!("CARGO_PKG_VERSION"),
    about,
    long_about = None,
    propagate_version = true
)]
pub struct App {
    /// Configuration file, instead of `$XDG_CONFIG_HOME/storefront/config.toml`.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `storefront_fetch=trace`.
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(
        alias = "dl",
        name = "download",
        about = "Download a file, revalidating an existing copy"
    )]
    Download(DownloadArg),
    #[command(
        alias = "as",
        name = "refresh-appstream",
        about = "Refresh the configured external AppStream files"
    )]
    RefreshAppstream(RefreshArg),
    #[command(
        alias = "rr",
        name = "refresh-ratings",
        about = "Refresh the cached ratings document"
    )]
    RefreshRatings(RefreshArg),
    #[command(alias = "r", name = "rating", about = "Show the star rating of apps")]
    Rating(RatingArg),
}

#[derive(Clone, Debug, Args)]
pub struct DownloadArg {
    /// `http(s)://` or `file://` URI to fetch.
    pub uri: String,
    /// Where the copy is kept.
    pub dest: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct RefreshArg {
    /// Revalidate even copies younger than the configured cache age.
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Debug, Args)]
pub struct RatingArg {
    /// App ids, e.g. `org.gnome.Maps` or `org.gnome.Maps.desktop`.
    #[arg(required = true)]
    pub app_ids: Vec<String>,
    /// Treat all given ids as names of one app and show its first match.
    #[arg(long)]
    pub any: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        App::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let app = App::try_parse_from([
            "storefront",
            "rating",
            "a",
            "b",
            "--any",
            "--config",
            "x.toml",
        ])
        .unwrap();
        assert_eq!(app.config, Some(PathBuf::from("x.toml")));
        let Commands::Rating(arg) = app.cmd else { panic!("expected rating") };
        assert_eq!(arg.app_ids, ["a", "b"]);
        assert!(arg.any);
    }
}
