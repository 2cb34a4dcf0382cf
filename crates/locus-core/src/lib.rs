//! # locus-core
//!
//! Shared domain types for the Locus server and client.
//!
//! - [`ids::ConnectionId`]: ephemeral identity of one real-time connection
//! - [`location`]: coordinates and timestamped locations
//! - [`events`]: the JSON frames exchanged over the WebSocket channel
//! - [`api`]: HTTP response bodies shared by server and client
//! - [`geo`]: haversine distance and pair enumeration

#![deny(unsafe_code)]

pub mod api;
pub mod errors;
pub mod events;
pub mod geo;
pub mod ids;
pub mod location;

pub use errors::CoreError;
pub use events::{ClientEvent, PeerLocation, ServerEvent};
pub use ids::ConnectionId;
pub use location::{Coordinate, Location};
