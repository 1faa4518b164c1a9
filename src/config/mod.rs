use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{CONFIG_ENV, find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    client: Client,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    /// JSON file backing the mock database. Omit to keep everything in memory.
    data_file: Option<PathBuf>,
    #[serde(default)]
    docs: bool,
}

/// Settings used by the course content store when it talks to the API.
#[derive(Debug, Deserialize)]
pub struct Client {
    api_url: String,
    cache_file: PathBuf,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                match Self::load(use_local) {
                    Ok(config) => config,
                    Err(ConfigError::ConfigNotFound(path)) => {
                        tracing::error!("Config not found at {}.", path.display());
                        std::process::exit(1);
                    }
                    Err(e) => {
                        crate::error::log_error(&e);
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn load(use_local: bool) -> ConfigResult<Self> {
        let bytes = read_config(use_local)?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        Ok(config)
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }
}

impl Client {
    #[inline]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[inline]
    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
    }

    #[test]
    fn client_section_defaults() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"

            [client]
            api_url = "http://localhost:8080/api/v1"
            cache_file = "cache.json"
        "#;

        let config = Config::from_slice(raw).unwrap();
        assert_eq!(config.client().timeout(), Duration::from_secs(5));
        assert_eq!(config.app().data_file(), None);
        assert!(!config.app().docs());
        assert_eq!(config.client().cache_file(), Path::new("cache.json"));
    }

    #[test]
    fn missing_section_is_rejected() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"
        "#;

        assert!(matches!(
            Config::from_slice(raw),
            Err(ConfigError::TomlDeError(_))
        ));
    }
}
