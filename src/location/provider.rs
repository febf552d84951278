use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use super::Coordinates;

pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json/?fields=status,message,lat,lon";

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location lookup is disabled. Set a latitude and longitude in the config.")]
    Unsupported,
    #[error("The request to get your location timed out.")]
    Timeout,
    #[error("Location information is unavailable: {0}")]
    Unavailable(String),
    #[error("Location lookup failed: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for LocationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LocationError::Timeout
        } else {
            LocationError::Http(err)
        }
    }
}

/// Produces a live coordinate reading.
pub trait LocationProvider: Send + Sync {
    fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Coordinates pinned by config or the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

impl LocationProvider for FixedLocation {
    fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Placeholder when lookups are switched off and nothing is pinned.
pub struct NoLocation;

impl LocationProvider for NoLocation {
    fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position from the public IP address.
pub struct IpLocator {
    url: String,
    client: reqwest::blocking::Client,
}

impl IpLocator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, LocationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

fn parse_lookup(body: &str) -> Result<Coordinates, LocationError> {
    let response: IpLookupResponse = serde_json::from_str(body)
        .map_err(|e| LocationError::Unavailable(format!("bad lookup response: {}", e)))?;

    if let Some(status) = response.status.as_deref() {
        if status != "success" {
            return Err(LocationError::Unavailable(
                response.message.unwrap_or_else(|| status.to_string()),
            ));
        }
    }

    match (response.lat, response.lon) {
        (Some(lat), Some(lon)) => Coordinates::new(lat, lon)
            .map_err(|e| LocationError::Unavailable(e.to_string())),
        _ => Err(LocationError::Unavailable(
            "lookup response had no coordinates".to_string(),
        )),
    }
}

impl LocationProvider for IpLocator {
    fn locate(&self) -> Result<Coordinates, LocationError> {
        log::debug!("Looking up location via {}", self.url);
        let response = self.client.get(&self.url).send()?;
        if !response.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "lookup answered {}",
                response.status()
            )));
        }
        let body = response.text()?;
        parse_lookup(&body)
    }
}
