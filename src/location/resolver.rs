use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Coordinates, LocationError, LocationProvider};
use crate::db::KeyValueStore;

pub const CACHE_KEY: &str = "last_location";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

impl CachedLocation {
    pub fn coords(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug)]
pub enum Resolution {
    /// A live reading; already written to the cache.
    Fresh(Coordinates),
    /// The live reading was skipped or failed and the cached pair stands in.
    Cached(Coordinates),
    /// No live reading and nothing cached.
    Unavailable(LocationError),
}

/// Stale-while-revalidate policy over the cached coordinate pair.
pub struct LocationResolver<'s> {
    store: &'s dyn KeyValueStore,
    max_age: Duration,
}

impl<'s> LocationResolver<'s> {
    pub fn new(store: &'s dyn KeyValueStore, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    pub fn cached(&self) -> Option<CachedLocation> {
        let raw = match self.store.get(CACHE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Reading cached location failed: {:#}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                log::warn!("Ignoring unreadable cached location: {}", e);
                None
            }
        }
    }

    /// A cached reading younger than `max_age` is served without a live lookup.
    pub fn recent(&self, now: DateTime<Utc>) -> Option<Coordinates> {
        self.cached()
            .filter(|c| now - c.recorded_at < self.max_age)
            .map(|c| c.coords())
    }

    pub fn remember(&self, coords: Coordinates, now: DateTime<Utc>) -> anyhow::Result<()> {
        let cached = CachedLocation {
            latitude: coords.latitude,
            longitude: coords.longitude,
            recorded_at: now,
        };
        self.store.set(CACHE_KEY, &serde_json::to_string(&cached)?)
    }

    pub fn forget(&self) -> anyhow::Result<()> {
        self.store.remove(CACHE_KEY)
    }

    /// Fold the outcome of a live reading into the cache.
    pub fn apply(
        &self,
        reading: Result<Coordinates, LocationError>,
        now: DateTime<Utc>,
    ) -> Resolution {
        match reading {
            Ok(coords) => {
                if let Err(e) = self.remember(coords, now) {
                    log::error!("Could not cache location: {:#}", e);
                }
                Resolution::Fresh(coords)
            }
            Err(err) => match self.cached() {
                Some(cached) => {
                    log::warn!("Location lookup failed ({}), using cached location", err);
                    Resolution::Cached(cached.coords())
                }
                None => Resolution::Unavailable(err),
            },
        }
    }

    /// Blocking resolution for one-shot commands.
    pub fn resolve(&self, provider: &dyn LocationProvider, now: DateTime<Utc>) -> Resolution {
        if let Some(coords) = self.recent(now) {
            log::debug!("Reusing location cached less than {}s ago", self.max_age.num_seconds());
            return Resolution::Cached(coords);
        }
        self.apply(provider.locate(), now)
    }
}
