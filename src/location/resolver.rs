//! Geocode resolver: Cache → PDOK → not found.
//!
//! "Not found" answers are cached like hits. Transport or payload failures
//! are not, so the next request asks again.

use super::providers::PdokLocatieserver;
use super::types::{Coordinate, LocationError, Place, DEFAULT_PLACE};
use crate::cache::TemporalCache;
use crate::clock::Clock;
use chrono::Duration;
use std::sync::Arc;

pub const GEOCODE_TTL_HOURS: i64 = 24;
pub const GEOCODE_CAPACITY: usize = 10;

/// Place-name lookups.
pub trait Geocoder: Send + Sync {
    fn lookup(&self, query: &str) -> Result<Option<Coordinate>, LocationError>;
}

impl Geocoder for PdokLocatieserver {
    fn lookup(&self, query: &str) -> Result<Option<Coordinate>, LocationError> {
        PdokLocatieserver::lookup(self, query)
    }
}

pub struct GeocodeResolver {
    geocoder: Arc<dyn Geocoder>,
    cache: TemporalCache<String, Option<Coordinate>>,
}

impl GeocodeResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, clock: Arc<dyn Clock>) -> Self {
        Self {
            geocoder,
            cache: TemporalCache::new(
                "geocode",
                Duration::hours(GEOCODE_TTL_HOURS),
                GEOCODE_CAPACITY,
                clock,
            ),
        }
    }

    /// Coordinates for a place name or postal code, or None.
    pub fn resolve(&self, query: &str) -> Option<Coordinate> {
        let key = normalize_query(query);
        if key.is_empty() {
            return None;
        }
        match self.cache.get_or_refresh(key.clone(), || self.geocoder.lookup(&key)) {
            Ok(found) => *found,
            Err(_) => None,
        }
    }

    /// Resolve `name`, or fall back to the default place.
    pub fn resolve_or_default(&self, name: &str) -> Place {
        match self.resolve(name) {
            Some(coordinate) => Place { name: name.to_string(), coordinate },
            None => {
                tracing::info!(query = name, fallback = DEFAULT_PLACE.name, "place not found, using default");
                DEFAULT_PLACE.as_fallback()
            }
        }
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }
}

/// Cache key: trimmed, lowercased, inner whitespace collapsed.
pub fn normalize_query(q: &str) -> String {
    q.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
