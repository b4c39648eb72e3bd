//! Core types for the location subsystem.

use crate::http::FetchError;
use serde::Serialize;
use thiserror::Error;

/// A WGS84 point. Both components are finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if lat.is_finite() && lon.is_finite() {
            Some(Self { lat, lon })
        } else {
            None
        }
    }
}

/// A named place with its coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    pub coordinate: Coordinate,
}

/// The built-in place used whenever a lookup comes back empty.
#[derive(Debug, Clone, Copy)]
pub struct DefaultPlace {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

pub const DEFAULT_PLACE: DefaultPlace = DefaultPlace {
    name: "Hattem",
    lat: 52.479108,
    lon: 6.060676,
};

impl DefaultPlace {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate { lat: self.lat, lon: self.lon }
    }

    pub fn to_place(&self) -> Place {
        Place {
            name: self.name.to_string(),
            coordinate: self.coordinate(),
        }
    }

    /// The place as shown when it stands in for an unknown one.
    pub fn as_fallback(&self) -> Place {
        Place {
            name: format!("{} (default)", self.name),
            coordinate: self.coordinate(),
        }
    }
}

/// Location lookup errors. Callers never see these: they are folded into
/// "not found" at the resolver boundary.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error(transparent)]
    Network(#[from] FetchError),
    #[error("invalid geocoder response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_rejects_non_finite() {
        assert!(Coordinate::new(52.5, 6.1).is_some());
        assert!(Coordinate::new(f64::NAN, 6.1).is_none());
        assert!(Coordinate::new(52.5, f64::INFINITY).is_none());
    }

    #[test]
    fn test_default_place_fallback_name() {
        assert_eq!(DEFAULT_PLACE.to_place().name, "Hattem");
        let fallback = DEFAULT_PLACE.as_fallback();
        assert_eq!(fallback.name, "Hattem (default)");
        assert!((fallback.coordinate.lat - 52.479108).abs() < 1e-9);
        assert!((fallback.coordinate.lon - 6.060676).abs() < 1e-9);
    }
}
