use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::NaiveDate;
use chrono_tz::Europe::Amsterdam;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::dashboard::TodayPage;
use crate::location::DEFAULT_PLACE;
use crate::metrics::forecast_index_offset;
use crate::solar::SolarError;
use crate::sun_times::SolarTimes;

use super::state::AppState;

pub const DEFAULT_DAYS_BACK: i64 = 10;
pub const DEFAULT_DAYS_AHEAD: i64 = 50;
/// Upper bound for `terug` and `vooruit`.
pub const MAX_RANGE_DAYS: i64 = 366;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

impl From<SolarError> for ApiError {
    fn from(e: SolarError) -> Self {
        tracing::error!(error = %e, "sun times failed");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        tracing::error!(error = %e, "blocking task failed");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SunTable {
    pub plaats: String,
    pub rows: Vec<SolarTimes>,
}

fn today(state: &AppState) -> NaiveDate {
    state.clock.now().with_timezone(&Amsterdam).date_naive()
}

/// First letter upper case, the rest lower case.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Whole number of days, or `default` when absent or not a number.
pub fn parse_days(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(default)
        .clamp(-MAX_RANGE_DAYS, MAX_RANGE_DAYS)
}

// ─── GET /vandaag ────────────────────────────────────────────────

pub async fn vandaag(State(state): State<Arc<AppState>>) -> Result<Json<SunTable>, ApiError> {
    let start = Instant::now();
    let place = DEFAULT_PLACE.to_place();
    let rows = state.solar.overview(today(&state), &place)?;

    tracing::info!(
        plaats = %place.name,
        rows = rows.len(),
        ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /vandaag"
    );
    Ok(Json(SunTable { plaats: place.name, rows }))
}

// ─── GET /weer ───────────────────────────────────────────────────

pub async fn weer(State(state): State<Arc<AppState>>) -> Result<Json<TodayPage>, ApiError> {
    let start = Instant::now();

    let page = tokio::task::spawn_blocking(move || -> Result<TodayPage, ApiError> {
        let place = DEFAULT_PLACE.to_place();
        let sun = state.solar.compute_for_day(
            today(&state),
            &place.name,
            place.coordinate.lat,
            place.coordinate.lon,
            false,
        )?;
        let weather = state.weather.current_weather();
        let water = state.water.current_water_level();
        let offset = forecast_index_offset(state.clock.as_ref());

        Ok(TodayPage::build(state.clock.now(), &place.name, sun, &weather, &water, offset))
    })
    .await??;

    tracing::info!(
        weather = page.weather.is_some(),
        water = %page.water.current_level,
        ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /weer"
    );
    Ok(Json(page))
}

// ─── GET /zon ────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct ZonQuery {
    pub plaats: Option<String>,
    pub terug: Option<String>,
    pub vooruit: Option<String>,
}

pub async fn zon(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ZonQuery>,
) -> Result<Json<SunTable>, ApiError> {
    let start = Instant::now();

    let requested = match params.plaats.as_deref() {
        Some(p) => capitalize(p),
        None => DEFAULT_PLACE.name.to_string(),
    };
    let back = parse_days(params.terug.as_deref(), DEFAULT_DAYS_BACK);
    let ahead = parse_days(params.vooruit.as_deref(), DEFAULT_DAYS_AHEAD);

    let table = tokio::task::spawn_blocking(move || -> Result<SunTable, ApiError> {
        let place = state.geocoder.resolve_or_default(&requested);
        let rows = state
            .solar
            .range(today(&state), &place.name, place.coordinate, back, ahead)?;
        Ok(SunTable { plaats: place.name, rows })
    })
    .await??;

    tracing::info!(
        plaats = %table.plaats,
        back,
        ahead,
        rows = table.rows.len(),
        ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /zon"
    );
    Ok(Json(table))
}
