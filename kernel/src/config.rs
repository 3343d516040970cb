// Service Configuration
//
// Locations of the store and the external collaborators. Loaded from
// JSON; anything left out falls back to the built-in defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundsConfig {
    /// JSON document holding every table.
    pub store_path: PathBuf,

    /// Address the HTTP request layer binds to.
    pub listen_addr: String,

    pub geocoder: GeocoderConfig,
    pub router: RouterConfig,

    /// Per-request timeout for collaborator calls.
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub url: String,
    pub costing: String,
    pub units: String,
}

impl RoundsConfig {
    /// Default built-in configuration (used if no config is provided).
    pub fn default_config() -> Self {
        Self {
            store_path: PathBuf::from("rounds.json"),
            listen_addr: "0.0.0.0:5000".into(),
            geocoder: GeocoderConfig::default(),
            router: RouterConfig::default(),
            http_timeout_secs: 30,
        }
    }
}

impl Default for RoundsConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:7070/search".into(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8002/optimized_route".into(),
            costing: "auto".into(),
            units: "kilometers".into(),
        }
    }
}
