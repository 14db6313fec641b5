pub mod db;
pub mod directory;
pub mod error;
pub mod types;

pub use directory::{SubscriberDirectory, SubscriberSource};
pub use error::{Result, SubscriberError};
pub use types::{Subscriber, SubscriberFilter};
