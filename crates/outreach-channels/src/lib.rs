pub mod channel;
pub mod error;
mod http;
pub mod manager;
pub mod sms;
pub mod telegram;
pub mod types;
pub mod whatsapp;

pub use channel::Channel;
pub use error::ChannelError;
pub use manager::ChannelManager;
pub use sms::SmsGatewayChannel;
pub use telegram::TelegramChannel;
pub use types::{ChannelStatus, OutboundMessage};
pub use whatsapp::WhatsAppChannel;
