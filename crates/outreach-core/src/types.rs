use serde::{Deserialize, Serialize};
use std::fmt;

/// Preferred language of a subscriber.
///
/// The wire format is the two-letter tag used by the dashboard
/// (`"en"`, `"hi"`, `"or"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "or")]
    Odia,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Odia];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Odia => "or",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::English),
            "hi" => Ok(Language::Hindi),
            "or" => Ok(Language::Odia),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// An outbound messaging channel a broadcast can be sent over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Whatsapp,
    Telegram,
    Sms,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Whatsapp, ChannelKind::Telegram, ChannelKind::Sms];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Whatsapp => "whatsapp",
            ChannelKind::Telegram => "telegram",
            ChannelKind::Sms => "sms",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = String;

    /// Case-insensitive; `"tg"` is accepted as shorthand for Telegram.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(ChannelKind::Whatsapp),
            "telegram" | "tg" => Ok(ChannelKind::Telegram),
            "sms" => Ok(ChannelKind::Sms),
            other => Err(format!("unsupported channel: {other}")),
        }
    }
}
