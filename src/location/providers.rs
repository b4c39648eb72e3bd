//! Geocoding provider: PDOK Locatieserver (free text search).

use super::types::{Coordinate, LocationError};
use crate::http::JsonSource;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub const PDOK_FREE_URL: &str = "https://api.pdok.nl/bzk/locatieserver/search/v3_1/free";

#[derive(Deserialize, Debug)]
struct PdokEnvelope {
    response: Option<PdokResponse>,
}

#[derive(Deserialize, Debug)]
struct PdokResponse {
    #[serde(rename = "numFound", default)]
    num_found: u64,
    #[serde(default)]
    docs: Vec<PdokDoc>,
}

#[derive(Deserialize, Debug)]
struct PdokDoc {
    centroide_ll: Option<String>,
    #[serde(default)]
    weergavenaam: Option<String>,
}

/// Client for the PDOK free-text endpoint.
#[derive(Clone)]
pub struct PdokLocatieserver {
    source: Arc<dyn JsonSource>,
    url: String,
}

impl PdokLocatieserver {
    pub fn new(source: Arc<dyn JsonSource>) -> Self {
        Self::with_url(source, PDOK_FREE_URL)
    }

    pub fn with_url(source: Arc<dyn JsonSource>, url: impl Into<String>) -> Self {
        Self { source, url: url.into() }
    }

    /// Look up the best match for `query`.
    ///
    /// `Ok(None)` means the service answered and found nothing.
    pub fn lookup(&self, query: &str) -> Result<Option<Coordinate>, LocationError> {
        let body = self.source.fetch_json(&self.url, &[("q", query)])?;
        parse_free_response(&body)
    }
}

/// Interpret a Locatieserver `free` response.
pub fn parse_free_response(body: &Value) -> Result<Option<Coordinate>, LocationError> {
    let envelope: PdokEnvelope =
        serde_json::from_value(body.clone()).map_err(|e| LocationError::InvalidResponse(e.to_string()))?;
    let response = envelope
        .response
        .ok_or_else(|| LocationError::InvalidResponse("missing 'response'".into()))?;

    if response.num_found == 0 {
        return Ok(None);
    }

    let doc = response
        .docs
        .first()
        .ok_or_else(|| LocationError::InvalidResponse("numFound > 0 but no docs".into()))?;
    let point = doc
        .centroide_ll
        .as_deref()
        .ok_or_else(|| LocationError::InvalidResponse("missing 'centroide_ll'".into()))?;

    let coord = parse_point(point)
        .ok_or_else(|| LocationError::InvalidResponse(format!("unparseable centroid '{}'", point)))?;
    tracing::debug!(
        name = doc.weergavenaam.as_deref().unwrap_or("?"),
        lat = coord.lat,
        lon = coord.lon,
        "geocoded"
    );
    Ok(Some(coord))
}

/// Parse a WKT `POINT(lon lat)`.
pub fn parse_point(wkt: &str) -> Option<Coordinate> {
    let inner = wkt.trim().strip_prefix("POINT(")?.strip_suffix(')')?;
    let mut parts = inner.split_whitespace();
    let lon: f64 = parts.next()?.parse().ok()?;
    let lat: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Coordinate::new(lat, lon)
}
