use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Hard cap on broadcast text length, counted in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const DEFAULT_MAX_CONCURRENT_SENDS: usize = 16;
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RECENT_WINDOW_SECS: u64 = 24 * 60 * 60;

pub const DEFAULT_WHATSAPP_API_BASE: &str = "https://graph.facebook.com/v16.0";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Top-level config (outreach.toml + OUTREACH_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutreachConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Credentials for each outbound transport. A channel without a section is
/// reported as unconfigured and every send over it fails.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    pub whatsapp: Option<WhatsAppConfig>,
    pub telegram: Option<TelegramConfig>,
    pub sms: Option<SmsConfig>,
}

/// WhatsApp Cloud API (Meta) credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    pub phone_number_id: String,
    pub access_token: String,
    #[serde(default = "default_whatsapp_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

/// Generic HTTP SMS gateway: `POST {endpoint}` with a bearer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Sender ID or short code shown to recipients, if the gateway supports it.
    pub sender_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Upper bound on in-flight per-recipient sends within one dispatch.
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,
    /// Per-request timeout applied by the HTTP transports.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sends: DEFAULT_MAX_CONCURRENT_SENDS,
            send_timeout_secs: DEFAULT_SEND_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Trailing window counted as "recent" in the stats endpoint.
    #[serde(default = "default_recent_window_secs")]
    pub recent_window_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            recent_window_secs: DEFAULT_RECENT_WINDOW_SECS,
        }
    }
}

impl AnalyticsConfig {
    pub fn recent_window(&self) -> chrono::Duration {
        i64::try_from(self.recent_window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_whatsapp_api_base() -> String {
    DEFAULT_WHATSAPP_API_BASE.to_string()
}
fn default_telegram_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}
fn default_max_concurrent_sends() -> usize {
    DEFAULT_MAX_CONCURRENT_SENDS
}
fn default_send_timeout_secs() -> u64 {
    DEFAULT_SEND_TIMEOUT_SECS
}
fn default_recent_window_secs() -> u64 {
    DEFAULT_RECENT_WINDOW_SECS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.outreach/outreach.db", home)
}

impl OutreachConfig {
    /// Load config from a TOML file with OUTREACH_* env var overrides.
    ///
    /// The file is the explicit path if given, else `~/.outreach/outreach.toml`.
    /// A missing file is not an error; defaults fill every absent key.
    /// Nested env keys use a double underscore, e.g.
    /// `OUTREACH_CHANNELS__TELEGRAM__BOT_TOKEN`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::OutreachError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(OutreachConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("OUTREACH_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.outreach/outreach.toml", home)
}
