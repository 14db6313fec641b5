use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use outreach_core::{config::ChannelsConfig, ChannelKind};
use tracing::{info, warn};

use crate::{
    channel::Channel, error::ChannelError, sms::SmsGatewayChannel, telegram::TelegramChannel,
    types::ChannelStatus, whatsapp::WhatsAppChannel,
};

/// Registry of outbound transports, keyed by [`ChannelKind`].
///
/// A kind with no registered transport is still a valid broadcast target;
/// lookups simply return `None` and the dispatcher counts every recipient as
/// failed.
pub struct ChannelManager {
    channels: HashMap<ChannelKind, Arc<dyn Channel>>,
}

impl ChannelManager {
    /// Create an empty manager with no registered channels.
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Build transports for every channel that has a config section.
    ///
    /// A section that fails validation is logged and skipped so one bad
    /// credential does not take the other channels down with it.
    pub fn from_config(cfg: &ChannelsConfig, timeout: Duration) -> Self {
        let mut manager = Self::new();

        if let Some(ref wa) = cfg.whatsapp {
            manager.register_result(WhatsAppChannel::new(wa, timeout));
        }
        if let Some(ref tg) = cfg.telegram {
            manager.register_result(TelegramChannel::new(tg, timeout));
        }
        if let Some(ref sms) = cfg.sms {
            manager.register_result(SmsGatewayChannel::new(sms, timeout));
        }

        for kind in ChannelKind::ALL {
            if !manager.channels.contains_key(&kind) {
                warn!(channel = %kind, "channel not configured; broadcasts over it will fail");
            }
        }
        manager
    }

    fn register_result<C: Channel + 'static>(&mut self, built: Result<C, ChannelError>) {
        match built {
            Ok(channel) => self.register(Arc::new(channel)),
            Err(e) => warn!(error = %e, "skipping channel with invalid configuration"),
        }
    }

    /// Register a transport.
    ///
    /// If a transport for the same kind is already registered it is replaced.
    pub fn register(&mut self, channel: Arc<dyn Channel>) {
        let kind = channel.kind();
        info!(channel = %kind, "registering channel transport");
        self.channels.insert(kind, channel);
    }

    /// Return a shared handle to the transport for `kind`, if one is registered.
    pub fn get(&self, kind: ChannelKind) -> Option<Arc<dyn Channel>> {
        self.channels.get(&kind).cloned()
    }

    /// Status of every supported channel, registered or not, in a stable order.
    pub fn statuses(&self) -> Vec<(ChannelKind, ChannelStatus)> {
        ChannelKind::ALL
            .iter()
            .map(|kind| {
                let status = self
                    .channels
                    .get(kind)
                    .map_or(ChannelStatus::Unconfigured, |ch| ch.status());
                (*kind, status)
            })
            .collect()
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
