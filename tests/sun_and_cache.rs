use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zonnetijden::cache::TemporalCache;
use zonnetijden::clock::{Clock, ManualClock};
use zonnetijden::dashboard::{TodayPage, WaterPanel};
use zonnetijden::location::DEFAULT_PLACE;
use zonnetijden::metrics::{delta_color, forecast_index_offset, Color};
use zonnetijden::snapshot::Availability;
use zonnetijden::solar::{horizon_crossing, Direction, NoaaEphemeris};
use zonnetijden::sun_times::SolarTimesService;
use zonnetijden::water::WaterSnapshot;

fn hattem_service() -> SolarTimesService {
    SolarTimesService::new(Arc::new(NoaaEphemeris))
}

#[test]
fn test_winter_solstice_in_hattem() {
    let times = hattem_service()
        .compute_solar_times("2024-12-21", "Hattem", DEFAULT_PLACE.lat, DEFAULT_PLACE.lon, false)
        .unwrap();
    assert_eq!(times.date, "2024-12-21");
    assert_eq!(times.sunrise, "08:44");
    assert_eq!(times.sunset, "16:23");
    assert_eq!(times.day_length, "7:38:43");
}

#[test]
fn test_seconds_are_truncated_not_rounded() {
    let times = hattem_service()
        .compute_solar_times("2024-12-21", "Hattem", DEFAULT_PLACE.lat, DEFAULT_PLACE.lon, true)
        .unwrap();
    assert_eq!(times.sunrise, "08:44:42");
    assert_eq!(times.sunset, "16:23:26");
}

#[test]
fn test_malformed_date_is_rejected() {
    let service = hattem_service();
    for bad in ["21-12-2024", "2024-13-01", "2024-12-21T00:00", ""] {
        assert!(service
            .compute_solar_times(bad, "Hattem", DEFAULT_PLACE.lat, DEFAULT_PLACE.lon, false)
            .is_err());
    }
}

#[test]
fn test_sunrise_before_sunset_all_year() {
    let service = hattem_service();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let rows = service
        .range(start, "Hattem", DEFAULT_PLACE.coordinate(), 0, 366)
        .unwrap();
    assert_eq!(rows.len(), 366);
    for row in rows {
        assert!(row.sunrise < row.sunset, "{:?}", row);
    }
}

#[test]
fn test_horizon_crossing_minutes() {
    let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
    let rise = horizon_crossing(date, chrono_tz::Europe::Amsterdam, DEFAULT_PLACE.lat, DEFAULT_PLACE.lon, Direction::Rising)
        .unwrap();
    let set = horizon_crossing(date, chrono_tz::Europe::Amsterdam, DEFAULT_PLACE.lat, DEFAULT_PLACE.lon, Direction::Setting)
        .unwrap();
    let hours = (set - rise).num_milliseconds() as f64 / 3_600_000.0;
    assert_abs_diff_eq!(hours, 7.6455, epsilon = 0.001);
}

#[test]
fn test_cache_serves_stale_and_recovers() {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 12, 21, 9, 0, 0).unwrap()));
    let cache: TemporalCache<(), u32> = TemporalCache::new("it", Duration::minutes(15), 1, clock.clone());
    let calls = AtomicUsize::new(0);

    let first = cache
        .get_or_refresh((), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(1)
        })
        .unwrap();
    assert_eq!(*first, 1);

    clock.advance(Duration::minutes(15));
    let stale = cache
        .get_or_refresh((), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<u32, _>("upstream down".to_string())
        })
        .unwrap();
    assert_eq!(*stale, 1);

    let fresh = cache
        .get_or_refresh((), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(2)
        })
        .unwrap();
    assert_eq!(*fresh, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_dashboard_after_rollover() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 12, 21, 15, 30, 0).unwrap());
    assert_eq!(forecast_index_offset(&clock), 1);
    assert_eq!(delta_color(12, 12), Color::LawnGreen);

    let sun = hattem_service()
        .compute_solar_times("2024-12-21", "Hattem", DEFAULT_PLACE.lat, DEFAULT_PLACE.lon, false)
        .unwrap();
    let water = Availability::Available(Arc::new(WaterSnapshot { current_level: 412, tomorrow_level: 412 }));
    let page = TodayPage::build(clock.now(), "Hattem", sun, &Availability::Unavailable, &water, 1);

    assert_eq!(page.weekday, "zaterdag");
    assert!(page.weather.is_none());
    assert_eq!(
        page.water,
        WaterPanel {
            current_level: "412".into(),
            tomorrow_level: "412".into(),
            current_color: Color::DodgerBlue,
            tomorrow_color: Color::LightBlue,
        }
    );
}
