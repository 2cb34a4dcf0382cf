//! Road routing between two coordinates.
//!
//! [`OpenRouteService`] asks the directions API for a driving route. Any
//! failure, including a missing API key, degrades to a two-point straight
//! line through [`route_or_straight_line`].

use std::time::Duration;

use async_trait::async_trait;
use locus_core::Coordinate;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::RouteError;

/// Default directions API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const ACCEPT_VALUE: &str =
    "application/json, application/geo+json, application/gpx+xml, img/png; charset=utf-8";

/// A polyline in `[longitude, latitude]` order.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteGeometry {
    /// Vertices as `[lon, lat]`.
    pub points: Vec<[f64; 2]>,
}

impl RouteGeometry {
    /// The two-point line `[[startLon, startLat], [endLon, endLat]]`.
    pub fn straight_line(start: Coordinate, end: Coordinate) -> Self {
        Self {
            points: vec![start.lon_lat(), end.lon_lat()],
        }
    }

    /// Vertices in display order `[lat, lon]`.
    pub fn to_display(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|[lon, lat]| [*lat, *lon]).collect()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the geometry has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Source of road geometry between two points.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Route from `start` to `end`.
    async fn route(&self, start: Coordinate, end: Coordinate) -> Result<RouteGeometry, RouteError>;
}

/// Ask `provider` for a route and fall back to a straight line on any error.
pub async fn route_or_straight_line(
    provider: &dyn RouteProvider,
    start: Coordinate,
    end: Coordinate,
) -> RouteGeometry {
    match provider.route(start, end).await {
        Ok(geometry) => geometry,
        Err(RouteError::MissingApiKey) => {
            info!("no routing API key, using straight line");
            RouteGeometry::straight_line(start, end)
        }
        Err(e) => {
            warn!(error = %e, "routing failed, using straight line");
            RouteGeometry::straight_line(start, end)
        }
    }
}

/// Provider that always answers with the straight line.
#[derive(Clone, Copy, Debug, Default)]
pub struct StraightLine;

#[async_trait]
impl RouteProvider for StraightLine {
    async fn route(&self, start: Coordinate, end: Coordinate) -> Result<RouteGeometry, RouteError> {
        Ok(RouteGeometry::straight_line(start, end))
    }
}

/// OpenRouteService directions client (`driving-car` profile).
pub struct OpenRouteService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenRouteService {
    /// Create a client against the public API.
    pub fn new(api_key: Option<String>) -> Result<Self, RouteError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a client against `base_url` with a request timeout.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RouteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("locus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RouteError::Network)?;
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    /// Whether a key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn directions_url(&self, start: Coordinate, end: Coordinate) -> String {
        format!(
            "{}/v2/directions/driving-car?start={},{}&end={},{}",
            self.base_url, start.longitude, start.latitude, end.longitude, end.latitude
        )
    }
}

#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: Vec<Vec<f64>>,
}

fn geometry_from(body: DirectionsResponse) -> Result<RouteGeometry, RouteError> {
    let feature = body
        .features
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::Malformed("no features".into()))?;
    let points = feature
        .geometry
        .coordinates
        .into_iter()
        .map(|c| match c.as_slice() {
            [lon, lat, ..] => Ok([*lon, *lat]),
            _ => Err(RouteError::Malformed("coordinate with fewer than two values".into())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err(RouteError::Malformed("empty geometry".into()));
    }
    Ok(RouteGeometry { points })
}

#[async_trait]
impl RouteProvider for OpenRouteService {
    async fn route(&self, start: Coordinate, end: Coordinate) -> Result<RouteGeometry, RouteError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(RouteError::MissingApiKey);
        };
        let url = self.directions_url(start, end);
        debug!(%url, "requesting route");

        let resp = self
            .client
            .get(&url)
            .header(ACCEPT, ACCEPT_VALUE)
            .header(AUTHORIZATION, key)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RouteError::Status(status.as_u16()));
        }
        let body: DirectionsResponse = resp.json().await?;
        geometry_from(body)
    }
}
