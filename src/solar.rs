//! Sunrise and sunset from the NOAA solar equations.
//!
//! The sun position terms (mean longitude, anomaly, equation of time,
//! declination) follow the NOAA spreadsheet. Event times are found by
//! solving the hour angle for the horizon zenith twice, the second pass
//! re-evaluated at the first estimate. Results are truncated to whole
//! microseconds.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono::{Datelike, Timelike};
use chrono_tz::Tz;
use std::f64::consts::PI;
use thiserror::Error;

const DEG: f64 = PI / 180.0;

/// Half the apparent diameter of the solar disc, in degrees.
const SUN_APPARENT_RADIUS: f64 = 32.0 / (60.0 * 2.0);

/// Zenith of the upper limb touching the horizon, before refraction.
pub const HORIZON_ZENITH: f64 = 90.0 + SUN_APPARENT_RADIUS;

/// Latitudes beyond this are clamped, the equations break down at the poles.
const MAX_LATITUDE: f64 = 89.8;

#[derive(Debug, Error)]
pub enum SolarError {
    #[error("invalid date '{input}', expected YYYY-MM-DD: {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("the sun does not {event} in {place} on {date}")]
    NoCrossing {
        place: String,
        date: NaiveDate,
        event: &'static str,
    },
}

/// Which horizon crossing to solve for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Setting,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Self::Rising => "rise",
            Self::Setting => "set",
        }
    }
}

/// Sunrise and sunset instants, each carrying its own UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarEvents {
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
}

/// Source of sunrise/sunset instants for a place and calendar date.
pub trait Ephemeris: Send + Sync {
    fn solar_events(
        &self,
        place: &str,
        tz: Tz,
        lat: f64,
        lon: f64,
        date: NaiveDate,
    ) -> Result<SolarEvents, SolarError>;
}

/// [`Ephemeris`] backed by the NOAA equations in this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoaaEphemeris;

impl Ephemeris for NoaaEphemeris {
    fn solar_events(
        &self,
        place: &str,
        tz: Tz,
        lat: f64,
        lon: f64,
        date: NaiveDate,
    ) -> Result<SolarEvents, SolarError> {
        let sunrise = horizon_crossing(date, tz, lat, lon, Direction::Rising);
        let sunset = horizon_crossing(date, tz, lat, lon, Direction::Setting);
        match (sunrise, sunset) {
            (Some(sunrise), Some(sunset)) => Ok(SolarEvents { sunrise, sunset }),
            (None, _) => Err(no_crossing(place, date, Direction::Rising)),
            (_, None) => Err(no_crossing(place, date, Direction::Setting)),
        }
    }
}

fn no_crossing(place: &str, date: NaiveDate, direction: Direction) -> SolarError {
    SolarError::NoCrossing {
        place: place.to_string(),
        date,
        event: direction.verb(),
    }
}

/// Convert a NaiveDateTime (assumed UTC) to Julian Date.
pub fn julian_date(dt: &NaiveDateTime) -> f64 {
    let y = dt.year() as f64;
    let m = dt.month() as f64;
    let d = dt.day() as f64;
    let h = dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;

    let (y2, m2) = if m <= 2.0 {
        (y - 1.0, m + 12.0)
    } else {
        (y, m)
    };

    let a = (y2 / 100.0_f64).floor();
    let b = 2.0 - a + (a / 4.0_f64).floor();

    (365.25_f64 * (y2 + 4716.0)).floor()
        + (30.6001_f64 * (m2 + 1.0)).floor()
        + d
        + h / 24.0
        + b
        - 1524.5
}

fn julian_century(jd: f64) -> f64 {
    (jd - 2451545.0) / 36525.0
}

fn normalize_degrees(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    d
}

fn sun_mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032))
}

fn sun_mean_anomaly(t: f64) -> f64 {
    357.52911 + t * (35999.05029 - t * 0.0001537)
}

fn earth_eccentricity(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + t * 0.0000001267)
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = sun_mean_anomaly(t) * DEG;
    m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289
}

fn sun_true_longitude(t: f64) -> f64 {
    sun_mean_longitude(t) + sun_equation_of_center(t)
}

fn sun_apparent_longitude(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    sun_true_longitude(t) - 0.00569 - 0.00478 * (omega * DEG).sin()
}

fn mean_obliquity(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0
}

fn obliquity_corrected(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    mean_obliquity(t) + 0.00256 * (omega * DEG).cos()
}

fn solar_declination(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let lambda = sun_apparent_longitude(t) * DEG;
    (e.sin() * lambda.sin()).asin() / DEG
}

/// Equation of time in minutes.
fn equation_of_time(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let l0 = sun_mean_longitude(t) * DEG;
    let ecc = earth_eccentricity(t);
    let m = sun_mean_anomaly(t) * DEG;

    let y = (e / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * ecc * m.sin()
        + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * ecc * ecc * (2.0 * m).sin();

    4.0 * eq / DEG
}

/// Atmospheric refraction in degrees for a given zenith angle.
pub fn refraction_at_zenith(zenith: f64) -> f64 {
    let elevation = 90.0 - zenith;
    if elevation >= 85.0 {
        return 0.0;
    }

    let te = (elevation * DEG).tan();
    let arcsec = if elevation > 5.0 {
        58.1 / te - 0.07 / te.powi(3) + 0.000086 / te.powi(5)
    } else if elevation > -0.575 {
        1735.0 + elevation * (-518.2 + elevation * (103.4 + elevation * (-12.79 + elevation * 0.711)))
    } else {
        -20.774 / te
    };
    arcsec / 3600.0
}

/// Hour angle in radians, or None when the sun never reaches `zenith`.
fn hour_angle(lat: f64, declination: f64, zenith: f64, direction: Direction) -> Option<f64> {
    let lat_r = lat * DEG;
    let decl_r = declination * DEG;
    let cos_h = ((zenith * DEG).cos() - lat_r.sin() * decl_r.sin()) / (lat_r.cos() * decl_r.cos());
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }
    let h = cos_h.acos();
    Some(match direction {
        Direction::Rising => h,
        Direction::Setting => -h,
    })
}

/// Minutes after 00:00 UTC on `date` at which the sun crosses `zenith`.
pub fn transit_minutes(date: NaiveDate, lat: f64, lon: f64, zenith: f64, direction: Direction) -> Option<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let zenith = zenith + refraction_at_zenith(zenith);
    let jd = julian_date(&date.and_time(chrono::NaiveTime::MIN));

    let mut adjustment = 0.0;
    let mut minutes = 0.0;
    for _ in 0..2 {
        let t = julian_century(jd + adjustment);
        let h = hour_angle(lat, solar_declination(t), zenith, direction)?;

        let delta = -lon - h / DEG;
        let mut offset = delta * 4.0 - equation_of_time(t);
        if offset < -720.0 {
            offset += 1440.0;
        }
        minutes = 720.0 + offset;
        adjustment = minutes / 1440.0;
    }
    Some(minutes)
}

/// Fractional minutes to a Duration, truncated to whole microseconds.
fn minutes_to_duration(minutes: f64) -> Duration {
    let days = (minutes / 1440.0).trunc();
    let seconds = (minutes - days * 1440.0) * 60.0;
    let whole = seconds.trunc();
    let micros = ((seconds - whole) * 1_000_000.0).trunc();
    Duration::days(days as i64) + Duration::seconds(whole as i64) + Duration::microseconds(micros as i64)
}

fn crossing_instant(date: NaiveDate, lat: f64, lon: f64, direction: Direction) -> Option<DateTime<Utc>> {
    let minutes = transit_minutes(date, lat, lon, HORIZON_ZENITH, direction)?;
    let midnight = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
    Some(midnight + minutes_to_duration(minutes))
}

/// The horizon crossing that falls on `date` in the local zone `tz`.
///
/// Far from the zone's meridian the UTC solution can land on the previous
/// or next local day; then the neighbouring UTC date is solved instead.
pub fn horizon_crossing(
    date: NaiveDate,
    tz: Tz,
    lat: f64,
    lon: f64,
    direction: Direction,
) -> Option<DateTime<FixedOffset>> {
    let mut at = crossing_instant(date, lat, lon, direction)?;
    let local_date = at.with_timezone(&tz).date_naive();
    if local_date != date {
        let shifted = if local_date < date {
            date.succ_opt()?
        } else {
            date.pred_opt()?
        };
        at = crossing_instant(shifted, lat, lon, direction)?;
    }
    let local = at.with_timezone(&tz);
    Some(local.with_timezone(&local.offset().fix()))
}
