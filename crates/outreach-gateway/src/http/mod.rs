pub mod analytics;
pub mod broadcast;
pub mod channels;
pub mod error;
pub mod health;
pub mod history;
pub mod subscribers;
