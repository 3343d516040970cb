// Nominatim Geocoder
//
// Resolves free-text addresses through a Nominatim `/search` endpoint and
// keeps the first hit.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::GeocoderConfig;
use crate::route::{CollaboratorError, Coordinate, Geocoder};

/// Subset of a Nominatim search hit we care about.
///
/// Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub lat: String,
    pub lon: String,
}

pub struct NominatimGeocoder {
    client: Client,
    url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig, timeout_secs: u64) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: super::http_client(&config.url, timeout_secs)?,
            url: config.url.clone(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Coordinate, CollaboratorError> {
        let body = self
            .client
            .get(&self.url)
            .query(&[("q", query), ("format", "json")])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| super::transport(&self.url, e))?;

        let coord = parse_search(&self.url, query, &body)?;
        log::debug!("geocoded {query:?} to ({}, {})", coord.lat, coord.lon);
        Ok(coord)
    }
}

/// Take the first hit of a search response body.
pub fn parse_search(url: &str, query: &str, body: &str) -> Result<Coordinate, CollaboratorError> {
    let decode = |message: String| CollaboratorError::Decode {
        url: url.to_string(),
        message,
    };

    let hits: Vec<SearchHit> = serde_json::from_str(body).map_err(|e| decode(e.to_string()))?;
    let first = hits
        .into_iter()
        .next()
        .ok_or_else(|| CollaboratorError::NoMatch(query.to_string()))?;

    let lat = first
        .lat
        .trim()
        .parse::<f64>()
        .map_err(|e| decode(format!("lat {:?}: {e}", first.lat)))?;
    let lon = first
        .lon
        .trim()
        .parse::<f64>()
        .map_err(|e| decode(format!("lon {:?}: {e}", first.lon)))?;

    Ok(Coordinate { lat, lon })
}
