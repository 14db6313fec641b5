use outreach_core::Language;
use serde::{Deserialize, Serialize};

/// A recipient who opted in to outreach alerts.
///
/// `phone` is the unique key and doubles as the channel address: an
/// international number for WhatsApp/SMS, a chat ID for Telegram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub phone: String,
    #[serde(default)]
    pub language: Language,
}

impl Subscriber {
    pub fn new(phone: impl Into<String>, language: Language) -> Self {
        Self {
            phone: phone.into(),
            language,
        }
    }
}

/// Narrowing applied by [`SubscriberDirectory::search`](crate::SubscriberDirectory::search).
///
/// An empty filter matches every subscriber.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriberFilter {
    /// Case-insensitive substring of the phone identifier.
    pub query: Option<String>,
    pub language: Option<Language>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_defaults_to_english_on_the_wire() {
        let sub: Subscriber = serde_json::from_str(r#"{"phone":"+911"}"#).unwrap();
        assert_eq!(sub.language, Language::English);
    }
}
