//! Shared configuration, error and vocabulary types for the outreach workspace.

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::OutreachConfig;
pub use error::{OutreachError, Result};
pub use types::{ChannelKind, Language};
