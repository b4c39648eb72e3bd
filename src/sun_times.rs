//! Display-ready sunrise, sunset and day length.
//!
//! All times are rendered in Europe/Amsterdam, whatever zone the ephemeris
//! hands back.

use crate::location::{Coordinate, Place};
use crate::solar::{Ephemeris, SolarError};
use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Europe::Amsterdam;
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;

/// Offsets in days for the `/vandaag` overview: four weeks back to four ahead.
pub const OVERVIEW_OFFSETS: [i64; 5] = [-28, -7, 0, 7, 28];

/// One row of sun times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolarTimes {
    pub date: String,
    pub sunrise: String,
    pub sunset: String,
    pub day_length: String,
}

/// Turns ephemeris output into [`SolarTimes`].
#[derive(Clone)]
pub struct SolarTimesService {
    ephemeris: Arc<dyn Ephemeris>,
    zone: Tz,
}

impl SolarTimesService {
    pub fn new(ephemeris: Arc<dyn Ephemeris>) -> Self {
        Self { ephemeris, zone: Amsterdam }
    }

    /// Sun times for `date` (strict `YYYY-MM-DD`) at the given place.
    pub fn compute_solar_times(
        &self,
        date: &str,
        place_name: &str,
        lat: f64,
        lon: f64,
        include_seconds: bool,
    ) -> Result<SolarTimes, SolarError> {
        let day = parse_date(date)?;
        self.compute_for_day(day, place_name, lat, lon, include_seconds)
    }

    pub fn compute_for_day(
        &self,
        day: NaiveDate,
        place_name: &str,
        lat: f64,
        lon: f64,
        include_seconds: bool,
    ) -> Result<SolarTimes, SolarError> {
        let events = self.ephemeris.solar_events(place_name, self.zone, lat, lon, day)?;

        Ok(SolarTimes {
            date: format_date(&events.sunrise),
            sunrise: format_time(&events.sunrise, include_seconds),
            sunset: format_time(&events.sunset, include_seconds),
            day_length: format_day_length(events.sunset - events.sunrise),
        })
    }

    /// The five-row overview around `today` for `place`, without seconds.
    pub fn overview(&self, today: NaiveDate, place: &Place) -> Result<Vec<SolarTimes>, SolarError> {
        OVERVIEW_OFFSETS
            .iter()
            .map(|offset| {
                let day = today + Duration::days(*offset);
                self.compute_for_day(day, &place.name, place.coordinate.lat, place.coordinate.lon, false)
            })
            .collect()
    }

    /// One row per day from `today - back` up to, not including, `today + ahead`.
    pub fn range(
        &self,
        today: NaiveDate,
        place_name: &str,
        coordinate: Coordinate,
        back: i64,
        ahead: i64,
    ) -> Result<Vec<SolarTimes>, SolarError> {
        (-back..ahead)
            .map(|offset| {
                let day = today + Duration::days(offset);
                self.compute_for_day(day, place_name, coordinate.lat, coordinate.lon, true)
            })
            .collect()
    }
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, SolarError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|source| SolarError::InvalidDate {
        input: input.to_string(),
        source,
    })
}

/// `YYYY-MM-DD` of the instant in Europe/Amsterdam.
pub fn format_date<Z: TimeZone>(at: &DateTime<Z>) -> String {
    at.with_timezone(&Amsterdam).format("%Y-%m-%d").to_string()
}

/// `HH:MM` or `HH:MM:SS` of the instant in Europe/Amsterdam.
pub fn format_time<Z: TimeZone>(at: &DateTime<Z>, seconds: bool) -> String {
    let fmt = if seconds { "%H:%M:%S" } else { "%H:%M" };
    at.with_timezone(&Amsterdam).format(fmt).to_string()
}

/// `H:MM:SS`, hours unpadded, fraction of a second dropped.
pub fn format_day_length(length: Duration) -> String {
    let total = length.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!("{}{}:{:02}:{:02}", sign, total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::DEFAULT_PLACE;
    use crate::solar::{NoaaEphemeris, SolarEvents};
    use chrono::{FixedOffset, Utc};

    fn service() -> SolarTimesService {
        SolarTimesService::new(Arc::new(NoaaEphemeris))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 7).unwrap()
    }

    #[test]
    fn test_format_date_in_amsterdam() {
        let at = Utc.with_ymd_and_hms(2024, 12, 7, 19, 2, 37).unwrap();
        assert_eq!(format_date(&at), "2024-12-07");

        // 23:30 UTC is already the next day in Amsterdam.
        let late = Utc.with_ymd_and_hms(2024, 12, 7, 23, 30, 0).unwrap();
        assert_eq!(format_date(&late), "2024-12-08");
    }

    #[test]
    fn test_format_time_converts_zone() {
        let at = Utc.with_ymd_and_hms(2024, 12, 7, 18, 2, 37).unwrap();
        assert_eq!(format_time(&at, false), "19:02");
        assert_eq!(format_time(&at, true), "19:02:37");

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let at = tokyo.with_ymd_and_hms(2024, 12, 8, 3, 2, 37).unwrap();
        assert_eq!(format_time(&at, true), "19:02:37");
    }

    #[test]
    fn test_format_day_length() {
        let from = Utc.with_ymd_and_hms(2024, 12, 7, 8, 32, 11).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 12, 7, 16, 21, 43).unwrap();
        assert_eq!(format_day_length(to - from), "7:49:32");
        assert_eq!(format_day_length(Duration::milliseconds(16 * 3600_000 + 999)), "16:00:00");
    }

    #[test]
    fn test_compute_hattem_winter_solstice() {
        let times = service()
            .compute_solar_times("2024-12-21", "Hattem", 52.479108, 6.060676, false)
            .unwrap();
        assert_eq!(
            times,
            SolarTimes {
                date: "2024-12-21".into(),
                sunrise: "08:44".into(),
                sunset: "16:23".into(),
                day_length: "7:38:43".into(),
            }
        );
    }

    #[test]
    fn test_compute_with_seconds() {
        let times = service()
            .compute_solar_times("2024-12-21", "Hattem", 52.479108, 6.060676, true)
            .unwrap();
        assert_eq!(times.sunrise, "08:44:42");
        assert_eq!(times.sunset, "16:23:26");
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        for bad in ["21-12-2024", "2024-13-01", "gisteren", ""] {
            let err = service()
                .compute_solar_times(bad, "Hattem", 52.479108, 6.060676, false)
                .unwrap_err();
            assert!(matches!(err, SolarError::InvalidDate { .. }), "{bad}");
        }
    }

    struct UtcEphemeris;

    impl Ephemeris for UtcEphemeris {
        fn solar_events(&self, _: &str, _: Tz, _: f64, _: f64, date: NaiveDate) -> Result<SolarEvents, SolarError> {
            let utc = FixedOffset::east_opt(0).unwrap();
            let at = |h, m, s| utc.from_utc_datetime(&date.and_hms_micro_opt(h, m, s, 750_000).unwrap());
            Ok(SolarEvents { sunrise: at(7, 44, 42), sunset: at(15, 23, 26) })
        }
    }

    #[test]
    fn test_utc_ephemeris_output_is_normalized() {
        let service = SolarTimesService::new(Arc::new(UtcEphemeris));
        let times = service.compute_solar_times("2024-12-21", "Hattem", 0.0, 0.0, true).unwrap();
        assert_eq!(times.sunrise, "08:44:42");
        assert_eq!(times.sunset, "16:23:26");
        assert_eq!(times.day_length, "7:38:44");
    }

    #[test]
    fn test_overview_rows() {
        let rows = service().overview(today(), &DEFAULT_PLACE.to_place()).unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["2024-11-09", "2024-11-30", "2024-12-07", "2024-12-14", "2025-01-04"]);
        assert!(rows.iter().all(|r| r.sunrise.len() == 5));
    }

    #[test]
    fn test_range_is_half_open() {
        let coord = Coordinate::new(52.537563, 6.11083).unwrap();
        let rows = service().range(today(), "Zwolle", coord, 10, 50).unwrap();
        assert_eq!(rows.len(), 60);
        assert_eq!(rows.first().unwrap().date, "2024-11-27");
        assert_eq!(rows.last().unwrap().date, "2025-01-25");
        assert!(rows.iter().all(|r| r.sunset.len() == 8));
    }

    #[test]
    fn test_sunrise_never_after_sunset() {
        let service = service();
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        for offset in (0..365).step_by(7) {
            let day = start + Duration::days(offset);
            let times = service.compute_for_day(day, "Hattem", 52.479108, 6.060676, true).unwrap();
            assert!(times.sunrise < times.sunset, "{}", times.date);
            assert!(!times.day_length.starts_with('-'));
        }
    }
}
