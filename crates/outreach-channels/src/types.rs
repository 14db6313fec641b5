use outreach_core::{ChannelKind, Language};
use serde::{Deserialize, Serialize};

/// A message to be delivered to one recipient over one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: ChannelKind,

    /// Platform address of the recipient: phone number for WhatsApp/SMS,
    /// chat ID for Telegram.
    pub recipient_id: String,

    /// Content to deliver, verbatim.
    pub content: String,

    /// Recipient's preferred language. Transports may forward it to the
    /// provider; nothing here translates the content.
    pub language: Language,
}

/// Runtime state of a channel transport as reported to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Credentials present; sends will be attempted.
    Ready,

    /// No credentials configured; every send over this channel fails.
    Unconfigured,
}
