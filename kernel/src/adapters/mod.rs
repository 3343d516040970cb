// HTTP Collaborator Adapters
//
// Blocking HTTP clients for the geocoding and route-optimization services.

pub mod nominatim;
pub mod valhalla;

use std::time::Duration;

use reqwest::blocking::Client;

use crate::route::CollaboratorError;

pub(crate) fn http_client(url: &str, timeout_secs: u64) -> Result<Client, CollaboratorError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CollaboratorError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
}

pub(crate) fn transport(url: &str, err: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}
