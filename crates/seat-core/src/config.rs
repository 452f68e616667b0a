use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_EVENT_URL: &str =
    "https://www.airsoft-verzeichnis.de/index.php?status=event&eventnummer=024906";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Configuration for a participant-count watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Event page that carries the participant count.
    pub url: String,
    /// User-Agent sent with every page fetch.
    pub user_agent: String,
    /// HTTP request timeout for page fetches and notifications.
    pub request_timeout: Duration,
    /// Pause between two checks (default: 3 minutes).
    pub poll_interval: Duration,
    /// Capacity of the event. A reading below it means a slot is free.
    pub threshold: u64,
    /// Append-only observation log.
    pub log_path: PathBuf,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EVENT_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(3 * 60),
            threshold: 45,
            log_path: PathBuf::from("teilnehmer_log.txt"),
        }
    }
}

impl WatchConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval = Duration::from_secs(secs);
        self
    }

    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }
}

/// Bot token and destination chat for Telegram delivery.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

// The token is a secret; keep it out of debug output.
impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramCredentials {
    /// Read `BOT_TOKEN` and `CHAT_ID` from the environment.
    ///
    /// Returns `None` if either variable is unset or empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_values(
            std::env::var("BOT_TOKEN").ok(),
            std::env::var("CHAT_ID").ok(),
        )
    }

    pub fn from_values(bot_token: Option<String>, chat_id: Option<String>) -> Option<Self> {
        let bot_token = bot_token.filter(|t| !t.trim().is_empty())?;
        let chat_id = chat_id.filter(|c| !c.trim().is_empty())?;
        Some(Self { bot_token, chat_id })
    }
}
