use outreach_core::ChannelKind;
use thiserror::Error;

/// Errors that can occur within any channel transport.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The request never got a usable response (DNS, TLS, connection reset, …).
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The provider answered but refused the message.
    #[error("Rejected by provider (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The provider did not answer within the transport timeout.
    #[error("Operation timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// No transport is registered for this channel.
    #[error("Channel not configured: {0}")]
    NotConfigured(ChannelKind),

    /// The channel-specific configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
