pub mod provider;
pub mod resolver;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub use provider::{FixedLocation, IpLocator, LocationError, LocationProvider, NoLocation};
pub use resolver::{CachedLocation, LocationResolver, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(anyhow!("Latitude {} is out of range", latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow!("Longitude {} is out of range", longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Within `tolerance` degrees on both axes.
    pub fn is_near(&self, other: &Coordinates, tolerance: f64) -> bool {
        (self.latitude - other.latitude).abs() <= tolerance
            && (self.longitude - other.longitude).abs() <= tolerance
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What the display layer knows about the location at any moment.
#[derive(Debug, Clone, Default)]
pub struct LocationState {
    pub coords: Option<Coordinates>,
    pub error: Option<String>,
    pub loading: bool,
}

impl LocationState {
    pub fn from_cache(cached: Option<Coordinates>) -> Self {
        Self {
            coords: cached,
            error: None,
            loading: false,
        }
    }

    /// Returns true when the coordinates changed.
    pub fn apply(&mut self, resolution: Resolution) -> bool {
        self.loading = false;
        match resolution {
            Resolution::Fresh(coords) | Resolution::Cached(coords) => {
                self.error = None;
                let changed = self.coords != Some(coords);
                self.coords = Some(coords);
                changed
            }
            Resolution::Unavailable(err) => {
                self.error = Some(err.to_string());
                false
            }
        }
    }
}
