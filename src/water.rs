//! River level at the Katerveer gauge, cached for two hours.

use crate::cache::TemporalCache;
use crate::clock::Clock;
use crate::http::{lenient_opt_f64, JsonSource};
use crate::snapshot::{Availability, SourceError};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const WATER_TTL_HOURS: i64 = 2;
pub const DEFAULT_WATER_URL: &str = "http://127.0.0.1:8084/waterstand";

/// A Rijkswaterstaat measuring station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Station {
    pub name: &'static str,
    pub code: &'static str,
}

/// Katerveer, on the IJssel near Zwolle.
pub const KATERVEER: Station = Station { name: "Katerveer", code: "KATV" };

/// Raw answer of the water-level service. Levels in centimetres.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WaterReading {
    pub resultaat: String,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub nu: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub morgen: Option<f64>,
}

impl WaterReading {
    pub fn is_ok(&self) -> bool {
        self.resultaat != "NOK"
    }
}

pub trait WaterLevelSource: Send + Sync {
    fn fetch_water_level(&self, station: &Station) -> Result<WaterReading, SourceError>;
}

/// Reads the level as JSON from an HTTP endpoint taking `locatie` and `code`.
pub struct HttpWaterLevels {
    source: Arc<dyn JsonSource>,
    url: String,
}

impl HttpWaterLevels {
    pub fn new(source: Arc<dyn JsonSource>, url: impl Into<String>) -> Self {
        Self { source, url: url.into() }
    }
}

impl WaterLevelSource for HttpWaterLevels {
    fn fetch_water_level(&self, station: &Station) -> Result<WaterReading, SourceError> {
        let body = self
            .source
            .fetch_json(&self.url, &[("locatie", station.name), ("code", station.code)])?;
        Ok(serde_json::from_value(body)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaterSnapshot {
    pub current_level: i64,
    pub tomorrow_level: i64,
}

impl TryFrom<WaterReading> for WaterSnapshot {
    type Error = SourceError;

    fn try_from(reading: WaterReading) -> Result<Self, Self::Error> {
        if !reading.is_ok() {
            return Err(SourceError::Upstream(format!("resultaat {}", reading.resultaat)));
        }
        Ok(Self {
            current_level: whole_level(reading.nu, "nu")?,
            tomorrow_level: whole_level(reading.morgen, "morgen")?,
        })
    }
}

/// Truncate a level to whole centimetres. Non-finite values are rejected.
fn whole_level(level: Option<f64>, field: &'static str) -> Result<i64, SourceError> {
    let level = level.ok_or(SourceError::MissingField(field))?;
    if !level.is_finite() {
        return Err(SourceError::Upstream(format!("{} is not a number: {}", field, level)));
    }
    Ok(level.trunc() as i64)
}

pub struct WaterSnapshotProvider {
    source: Arc<dyn WaterLevelSource>,
    station: Station,
    cache: TemporalCache<(), WaterSnapshot>,
}

impl WaterSnapshotProvider {
    pub fn new(source: Arc<dyn WaterLevelSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            station: KATERVEER,
            cache: TemporalCache::new("water", Duration::hours(WATER_TTL_HOURS), 1, clock),
        }
    }

    pub fn current_water_level(&self) -> Availability<WaterSnapshot> {
        self.cache
            .get_or_refresh((), || {
                let reading = self.source.fetch_water_level(&self.station)?;
                let snapshot = WaterSnapshot::try_from(reading)?;
                tracing::info!(
                    station = self.station.code,
                    now = snapshot.current_level,
                    tomorrow = snapshot.tomorrow_level,
                    "water level refreshed"
                );
                Ok::<_, SourceError>(snapshot)
            })
            .into()
    }
}
