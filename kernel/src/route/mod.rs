// Route Collaborators
//
// Interfaces for the two external services used to re-sequence a table:
// a geocoder turning free text into coordinates, and a route optimizer
// returning those coordinates in visiting order.
//
// This module defines *interfaces only*. HTTP implementations live under
// `crate::adapters`.

use serde::{Deserialize, Serialize};

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// One stop of an optimized route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimisedLocation {
    pub lat: f64,
    pub lon: f64,

    /// Position of this stop in the optimizer's input.
    pub original_index: usize,
}

/// Failure of an external collaborator call.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("no match for {0:?}")]
    NoMatch(String),
}

/// Free text to coordinates.
pub trait Geocoder {
    fn geocode(&self, query: &str) -> Result<Coordinate, CollaboratorError>;
}

/// Coordinates to visiting order.
///
/// Implementations must return every input exactly once, tagged with its
/// `original_index`.
pub trait RouteOptimizer {
    fn optimise(&self, stops: &[Coordinate]) -> Result<Vec<OptimisedLocation>, CollaboratorError>;
}

impl<T: Geocoder + ?Sized> Geocoder for &T {
    fn geocode(&self, query: &str) -> Result<Coordinate, CollaboratorError> {
        (**self).geocode(query)
    }
}

impl<T: RouteOptimizer + ?Sized> RouteOptimizer for &T {
    fn optimise(&self, stops: &[Coordinate]) -> Result<Vec<OptimisedLocation>, CollaboratorError> {
        (**self).optimise(stops)
    }
}
