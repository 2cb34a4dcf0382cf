//! # locus-client
//!
//! Client side of live location sharing: keeps a mirror of every peer the
//! server reports, routes between each pair of peers and labels the
//! great-circle distance.
//!
//! - [`route`]: routing provider trait, OpenRouteService implementation and
//!   the straight-line fallback
//! - [`planner::RoutePlanner`]: one route leg per unordered peer pair
//! - [`client::MapClient`]: applies server events to a [`surface::MapSurface`]
//! - [`transport`]: WebSocket connection to a Locus server

#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod mirror;
pub mod planner;
pub mod route;
pub mod surface;
pub mod transport;

pub use client::MapClient;
pub use error::{ClientError, RouteError};
pub use route::{OpenRouteService, RouteGeometry, RouteProvider};
pub use surface::{MapSurface, TracingSurface};
