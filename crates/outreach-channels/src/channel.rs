use async_trait::async_trait;
use outreach_core::ChannelKind;

use crate::{
    error::ChannelError,
    types::{ChannelStatus, OutboundMessage},
};

/// Common interface implemented by every outbound transport (WhatsApp, Telegram, SMS).
///
/// Implementations must be `Send + Sync` so one instance can serve every
/// concurrent send of a broadcast.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Which channel this transport delivers over.
    ///
    /// Used as the key inside [`ChannelManager`](crate::manager::ChannelManager);
    /// registering a second transport for the same kind replaces the first.
    fn kind(&self) -> ChannelKind;

    /// Deliver a single message to one recipient.
    ///
    /// One call is one attempt: implementations must not retry. Any failure,
    /// including a transport timeout, is returned as an error.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError>;

    /// Return the current status without blocking.
    fn status(&self) -> ChannelStatus;
}
