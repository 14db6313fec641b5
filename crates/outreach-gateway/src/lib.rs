//! `outreach-gateway`: the HTTP surface of the outreach broadcast backend.
//!
//! The binary in `main.rs` wires config, SQLite and channel transports into an
//! [`AppState`] and serves [`build_router`]. Tests drive the same router
//! in-process.

pub mod app;
pub mod http;

pub use app::{build_router, AppState};
