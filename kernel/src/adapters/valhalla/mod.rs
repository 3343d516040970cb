// Valhalla Route Optimizer
//
// Posts stops to a Valhalla `/optimized_route` endpoint and reads back the
// trip locations in visiting order.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::RouterConfig;
use crate::route::{CollaboratorError, Coordinate, OptimisedLocation, RouteOptimizer};

#[derive(Debug, Serialize)]
pub struct OptimizedRouteRequest<'a> {
    pub locations: &'a [Coordinate],
    pub costing: &'a str,
    pub directions_options: DirectionsOptions<'a>,
}

#[derive(Debug, Serialize)]
pub struct DirectionsOptions<'a> {
    pub units: &'a str,
}

/// Subset of the optimized route response.
///
/// Legs, summaries and maneuvers are ignored.
#[derive(Debug, Deserialize)]
pub struct OptimizedRouteResponse {
    pub trip: Trip,
}

#[derive(Debug, Deserialize)]
pub struct Trip {
    pub locations: Vec<OptimisedLocation>,
}

pub struct ValhallaOptimizer {
    client: Client,
    config: RouterConfig,
}

impl ValhallaOptimizer {
    pub fn new(config: &RouterConfig, timeout_secs: u64) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: super::http_client(&config.url, timeout_secs)?,
            config: config.clone(),
        })
    }

    pub fn request<'a>(&'a self, stops: &'a [Coordinate]) -> OptimizedRouteRequest<'a> {
        OptimizedRouteRequest {
            locations: stops,
            costing: &self.config.costing,
            directions_options: DirectionsOptions {
                units: &self.config.units,
            },
        }
    }
}

impl RouteOptimizer for ValhallaOptimizer {
    fn optimise(&self, stops: &[Coordinate]) -> Result<Vec<OptimisedLocation>, CollaboratorError> {
        let url = &self.config.url;
        let body = self
            .client
            .post(url)
            .json(&self.request(stops))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| super::transport(url, e))?;

        let locations = parse_trip(url, &body)?;
        log::debug!("optimized route over {} stop(s)", locations.len());
        Ok(locations)
    }
}

pub fn parse_trip(url: &str, body: &str) -> Result<Vec<OptimisedLocation>, CollaboratorError> {
    let response: OptimizedRouteResponse =
        serde_json::from_str(body).map_err(|e| CollaboratorError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    Ok(response.trip.locations)
}
