//! Layered configuration: built-in defaults, then a TOML file, then
//! `STOREFRONT_*` environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use storefront_fetch::{DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use thiserror::Error;

use crate::logging::DEFAULT_LOG_LEVEL;

pub const ENV_PREFIX: &str = "STOREFRONT_";
pub const DEFAULT_REVIEW_SERVER: &str = "https://odrs.gnome.org/1.0/reviews/api";
/// One day.
pub const DEFAULT_CACHE_AGE_SECS: u64 = 24 * 60 * 60;

const APP_DIR: &str = "storefront";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {} does not exist", .0.display())]
    Missing(PathBuf),
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// Root of every cached download.
    pub cache_dir: PathBuf,
    /// Base URL of the ratings and reviews server.
    pub review_server: String,
    /// External AppStream files kept in `<cache_dir>/appstream`.
    pub appstream_urls: Vec<String>,
    /// Cached copies younger than this are not revalidated.
    pub cache_age_secs: u64,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub chunk_size: usize,
    pub log_level: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            review_server: DEFAULT_REVIEW_SERVER.to_string(),
            appstream_urls: Vec::new(),
            cache_age_secs: DEFAULT_CACHE_AGE_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist; otherwise
    /// `$XDG_CONFIG_HOME/storefront/config.toml` is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) if !path.exists() => return Err(ConfigError::Missing(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be greater than zero".into()));
        }
        match url::Url::parse(&self.review_server) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            Ok(url) => Err(ConfigError::Invalid(format!(
                "review_server must be an http(s) URL, not {}",
                url.scheme()
            ))),
            Err(e) => Err(ConfigError::Invalid(format!("review_server: {e}"))),
        }
    }

    pub fn cache_age(&self) -> Duration {
        Duration::from_secs(self.cache_age_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn appstream_dir(&self) -> PathBuf {
        self.cache_dir.join("appstream")
    }
}

fn xdg_dir(var: &str, fallback: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join(fallback)))
}

fn default_cache_dir() -> PathBuf {
    xdg_dir("XDG_CACHE_HOME", ".cache")
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR)
}

fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            let dir = jail.directory().to_path_buf();
            jail.set_env("XDG_CONFIG_HOME", dir.display());
            jail.set_env("XDG_CACHE_HOME", dir.join("cache").display());

            let config = StorefrontConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.review_server, DEFAULT_REVIEW_SERVER);
            assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
            assert_eq!(config.cache_dir, dir.join("cache").join("storefront"));
            assert!(config.appstream_urls.is_empty());
            Ok(())
        });
    }

    #[test]
    fn file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                review_server = "https://reviews.example.org/api"
                appstream_urls = ["https://example.org/flathub.xml"]
                chunk_size = 1024
                "#,
            )?;
            jail.set_env("STOREFRONT_CHUNK_SIZE", "4096");

            let config = StorefrontConfig::load(Some(Path::new("custom.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.review_server, "https://reviews.example.org/api");
            assert_eq!(config.appstream_urls, ["https://example.org/flathub.xml"]);
            assert_eq!(config.chunk_size, 4096);
            Ok(())
        });
    }

    #[test]
    fn explicit_file_must_exist() {
        let err = StorefrontConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn rejects_invalid_values() {
        let config = StorefrontConfig {
            chunk_size: 0,
            ..StorefrontConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = StorefrontConfig {
            review_server: "ftp://reviews.example.org".into(),
            ..StorefrontConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
