//! # locus-server
//!
//! Axum HTTP + WebSocket server for live location sharing.
//!
//! - [`registry::SessionRegistry`]: connection id → last known location
//! - [`relay::Relay`]: single-owner task that applies updates and fans them
//!   out to every connected client
//! - [`websocket`]: per-connection session with heartbeat
//! - [`server::LocusServer`]: router, HTTP endpoints, listen/stop

#![deny(unsafe_code)]

pub mod config;
pub mod cors;
pub mod error;
pub mod health;
pub mod metrics;
pub mod page;
pub mod registry;
pub mod relay;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use error::{RelayClosed, ServerError};
pub use server::LocusServer;
