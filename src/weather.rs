//! Current weather for Hattem from weerlive.nl, cached for 15 minutes.

use crate::cache::TemporalCache;
use crate::clock::Clock;
use crate::http::{lenient_f64, JsonSource};
use crate::snapshot::{Availability, SourceError};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const WEERLIVE_URL: &str = "https://weerlive.nl/api/weerlive_api_v2.php";
pub const WEATHER_TTL_MINUTES: i64 = 15;
pub const WEATHER_LOCATION: &str = "Hattem";

/// One row of the multi-day forecast (`wk_verw`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    #[serde(deserialize_with = "lenient_f64")]
    pub max_temp: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub min_temp: f64,
}

/// What the dashboard needs from one weerlive answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub temp: f64,
    pub felt_temp: f64,
    pub summary: String,
    pub forecast_text: String,
    pub wind_direction: String,
    pub wind_force: String,
    pub days: Vec<DayForecast>,
    pub source: String,
}

#[derive(Deserialize)]
struct LiveWeather {
    #[serde(deserialize_with = "lenient_f64")]
    temp: f64,
    #[serde(deserialize_with = "lenient_f64")]
    gtemp: f64,
    #[serde(default)]
    samenv: String,
    #[serde(default)]
    verw: String,
    #[serde(default)]
    windr: String,
    #[serde(default)]
    windbft: Value,
}

#[derive(Deserialize)]
struct ApiInfo {
    #[serde(default)]
    bron: String,
}

/// Decode a weerlive v2 payload.
///
/// A missing or empty `liveweer`, or a `fout` member on its first element,
/// is an upstream error.
pub fn parse_weerlive(body: &Value) -> Result<WeatherSnapshot, SourceError> {
    let live = body
        .get("liveweer")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .ok_or(SourceError::MissingField("liveweer"))?;

    if let Some(fout) = live.get("fout").filter(|v| !v.is_null()) {
        let message = fout.as_str().map(str::to_string).unwrap_or_else(|| fout.to_string());
        return Err(SourceError::Upstream(message));
    }

    let live: LiveWeather = serde_json::from_value(live.clone())?;
    let days: Vec<DayForecast> = match body.get("wk_verw") {
        Some(rows) => serde_json::from_value(rows.clone())?,
        None => return Err(SourceError::MissingField("wk_verw")),
    };
    let source = body
        .get("api")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .map(|api| serde_json::from_value::<ApiInfo>(api.clone()))
        .transpose()?
        .map(|api| api.bron)
        .unwrap_or_default();

    Ok(WeatherSnapshot {
        temp: live.temp,
        felt_temp: live.gtemp,
        summary: live.samenv,
        forecast_text: live.verw,
        wind_direction: live.windr,
        wind_force: scalar_text(&live.windbft),
        days,
        source,
    })
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Weather provider with a single-slot 15 minute cache.
pub struct WeatherSnapshotProvider {
    source: Arc<dyn JsonSource>,
    url: String,
    api_key: String,
    location: String,
    cache: TemporalCache<(), WeatherSnapshot>,
}

impl WeatherSnapshotProvider {
    pub fn new(source: Arc<dyn JsonSource>, api_key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            url: WEERLIVE_URL.to_string(),
            api_key: api_key.into(),
            location: WEATHER_LOCATION.to_string(),
            cache: TemporalCache::new("weather", Duration::minutes(WEATHER_TTL_MINUTES), 1, clock),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn current_weather(&self) -> Availability<WeatherSnapshot> {
        self.cache.get_or_refresh((), || self.fetch()).into()
    }

    fn fetch(&self) -> Result<WeatherSnapshot, SourceError> {
        let body = self.source.fetch_json(
            &self.url,
            &[("key", self.api_key.as_str()), ("locatie", self.location.as_str())],
        )?;
        let snapshot = parse_weerlive(&body)?;
        tracing::info!(temp = snapshot.temp, days = snapshot.days.len(), "weather refreshed");
        Ok(snapshot)
    }
}
