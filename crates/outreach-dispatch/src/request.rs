use outreach_core::{config::MAX_MESSAGE_CHARS, ChannelKind};

use crate::error::DispatchError;

/// A validated broadcast request.
///
/// Only constructible through [`BroadcastRequest::new`] or
/// [`BroadcastRequest::parse`], so holding one proves the text and channel
/// passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRequest {
    text: String,
    channel: ChannelKind,
}

impl BroadcastRequest {
    /// Validate `text` for an already-typed channel.
    ///
    /// The text must contain something other than whitespace and be at most
    /// [`MAX_MESSAGE_CHARS`] characters. It is kept exactly as given.
    pub fn new(text: impl Into<String>, channel: ChannelKind) -> Result<Self, DispatchError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DispatchError::Validation {
                field: "text",
                reason: "must not be empty".to_string(),
            });
        }
        let chars = text.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(DispatchError::Validation {
                field: "text",
                reason: format!("{chars} characters exceeds the {MAX_MESSAGE_CHARS} limit"),
            });
        }
        Ok(Self { text, channel })
    }

    /// Validate raw input as received over the wire.
    pub fn parse(text: impl Into<String>, channel: &str) -> Result<Self, DispatchError> {
        let channel = channel
            .parse::<ChannelKind>()
            .map_err(|reason| DispatchError::Validation {
                field: "channel",
                reason,
            })?;
        Self::new(text, channel)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn channel(&self) -> ChannelKind {
        self.channel
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
