//! TOML configuration file schema and parsing.
//!
//! Every key is optional. Example config file:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! log_format = "json"
//!
//! [watch]
//! url = "https://www.airsoft-verzeichnis.de/index.php?status=event&eventnummer=024906"
//! interval_secs = 180
//! threshold = 45
//! log_file = "teilnehmer_log.txt"
//!
//! [telegram]
//! api_base = "https://api.telegram.org"
//! ```
//!
//! The bot token and chat id are only read from `BOT_TOKEN` / `CHAT_ID`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use seat_core::config::{DEFAULT_EVENT_URL, DEFAULT_TELEGRAM_API, DEFAULT_USER_AGENT};
use seat_core::WatchConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub watch: WatchDef,

    #[serde(default)]
    pub telegram: TelegramDef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_format: default_log_format(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchDef {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_threshold")]
    pub threshold: u64,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WatchDef {
    fn default() -> Self {
        Self {
            url: default_url(),
            interval_secs: default_interval_secs(),
            threshold: default_threshold(),
            log_file: default_log_file(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_EVENT_URL.into()
}

fn default_interval_secs() -> u64 {
    180
}

fn default_threshold() -> u64 {
    45
}

fn default_log_file() -> PathBuf {
    PathBuf::from("teilnehmer_log.txt")
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

impl WatchDef {
    pub fn to_watch_config(&self) -> WatchConfig {
        WatchConfig::default()
            .with_url(&self.url)
            .with_poll_interval(self.interval_secs)
            .with_threshold(self.threshold)
            .with_log_path(&self.log_file)
            .with_request_timeout(self.request_timeout_secs)
            .with_user_agent(&self.user_agent)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramDef {
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for TelegramDef {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_TELEGRAM_API.into()
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<SocketAddr>,
    pub url: Option<String>,
    pub threshold: Option<u64>,
    pub interval_secs: Option<u64>,
}

impl AppConfig {
    /// Load the file at `path`, or the defaults when no path is given, then
    /// apply `overrides` and validate the result.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self, String> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(listen) = overrides.listen {
            self.server.listen = listen;
        }
        if let Some(url) = overrides.url {
            self.watch.url = url;
        }
        if let Some(threshold) = overrides.threshold {
            self.watch.threshold = threshold;
        }
        if let Some(secs) = overrides.interval_secs {
            self.watch.interval_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), String> {
        let parsed = url::Url::parse(&self.watch.url)
            .map_err(|e| format!("Invalid watch URL: {} ({})", self.watch.url, e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(format!("Watch URL must use http or https: {}", self.watch.url));
        }

        url::Url::parse(&self.telegram.api_base).map_err(|e| {
            format!("Invalid Telegram API base: {} ({})", self.telegram.api_base, e)
        })?;

        if self.watch.interval_secs == 0 {
            return Err("interval_secs must be greater than 0".into());
        }
        if self.watch.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".into());
        }
        if self.watch.threshold == 0 {
            return Err("threshold must be greater than 0".into());
        }

        match self.server.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }
}
