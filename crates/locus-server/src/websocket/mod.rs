//! WebSocket plumbing: per-client outbound queue and session lifecycle.

pub mod connection;
pub mod session;
