//! Location subsystem: place names and postal codes to coordinates.
//!
//! Lookups go to the PDOK Locatieserver through a 24 hour cache; anything
//! that cannot be resolved falls back to the default place.

pub mod providers;
pub mod resolver;
pub mod types;

pub use providers::PdokLocatieserver;
pub use resolver::{GeocodeResolver, Geocoder};
pub use types::{Coordinate, DefaultPlace, LocationError, Place, DEFAULT_PLACE};
