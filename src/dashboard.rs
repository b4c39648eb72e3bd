//! Display-ready fields for the `/weer` page.

use crate::metrics::{delta_color, water_trend_colors, Color};
use crate::snapshot::Availability;
use crate::sun_times::SolarTimes;
use crate::water::WaterSnapshot;
use crate::weather::{DayForecast, WeatherSnapshot};
use chrono::{DateTime, Locale, Utc};
use chrono_tz::Europe::Amsterdam;
use serde::Serialize;

/// Forecast days shown with min/max, today included.
const SHOWN_DAYS: usize = 4;
/// Row compared against today's maximum for the fifth day.
const OUTLOOK_ROW: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub max_temp: f64,
    pub min_temp: f64,
    /// Maximum compared with today's maximum.
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherPanel {
    pub temp: f64,
    pub felt_temp: f64,
    pub felt_color: Color,
    pub summary: String,
    pub forecast_text: String,
    pub wind_direction: String,
    pub wind_force: String,
    pub days: Vec<ForecastDay>,
    pub outlook_color: Color,
    pub source: String,
}

impl WeatherPanel {
    /// Build the panel, or None when the forecast has too few rows for `offset`.
    pub fn from_snapshot(snapshot: &WeatherSnapshot, offset: usize) -> Option<Self> {
        let rows = &snapshot.days;
        if rows.len() < SHOWN_DAYS + offset {
            tracing::warn!(rows = rows.len(), offset, "forecast too short for the weather panel");
            return None;
        }

        let today_max = whole(rows[offset].max_temp);
        let days = rows[offset..offset + SHOWN_DAYS]
            .iter()
            .map(|row: &DayForecast| ForecastDay {
                max_temp: row.max_temp,
                min_temp: row.min_temp,
                color: delta_color(today_max, whole(row.max_temp)),
            })
            .collect();
        let outlook = &rows[OUTLOOK_ROW.min(rows.len() - 1)];

        Some(Self {
            temp: snapshot.temp,
            felt_temp: snapshot.felt_temp,
            felt_color: delta_color(whole(snapshot.temp), whole(snapshot.felt_temp)),
            summary: snapshot.summary.clone(),
            forecast_text: snapshot.forecast_text.clone(),
            wind_direction: snapshot.wind_direction.clone(),
            wind_force: snapshot.wind_force.clone(),
            days,
            outlook_color: delta_color(today_max, whole(outlook.max_temp)),
            source: snapshot.source.clone(),
        })
    }
}

fn whole(t: f64) -> i64 {
    t.trunc() as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaterPanel {
    pub current_level: String,
    pub tomorrow_level: String,
    pub current_color: Color,
    pub tomorrow_color: Color,
}

impl WaterPanel {
    pub fn from_availability(water: &Availability<WaterSnapshot>) -> Self {
        match water.get() {
            Some(w) => {
                let (current_color, tomorrow_color) = water_trend_colors(w.current_level, w.tomorrow_level);
                Self {
                    current_level: w.current_level.to_string(),
                    tomorrow_level: w.tomorrow_level.to_string(),
                    current_color,
                    tomorrow_color,
                }
            }
            None => Self {
                current_level: "-".to_string(),
                tomorrow_level: "-".to_string(),
                current_color: Color::Red,
                tomorrow_color: Color::Red,
            },
        }
    }
}

/// Everything the `/weer` page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayPage {
    pub plaats: String,
    #[serde(flatten)]
    pub sun: SolarTimes,
    pub weather: Option<WeatherPanel>,
    pub water: WaterPanel,
    pub color: Color,
    pub day: String,
    pub weekday: String,
    pub month: String,
}

impl TodayPage {
    pub fn build(
        now: DateTime<Utc>,
        plaats: &str,
        sun: SolarTimes,
        weather: &Availability<WeatherSnapshot>,
        water: &Availability<WaterSnapshot>,
        offset: usize,
    ) -> Self {
        let local = now.with_timezone(&Amsterdam);
        let dutch = |fmt: &str| local.format_localized(fmt, Locale::nl_NL).to_string();

        Self {
            plaats: plaats.to_string(),
            sun,
            weather: weather.get().and_then(|w| WeatherPanel::from_snapshot(w, offset)),
            water: WaterPanel::from_availability(water),
            color: Color::LawnGreen,
            day: dutch("%-d"),
            weekday: dutch("%A"),
            month: dutch("%B"),
        }
    }
}
