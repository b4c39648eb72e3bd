mod handlers;
mod state;

pub use handlers::{capitalize, parse_days, SunTable, ZonQuery};
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/vandaag", get(handlers::vandaag))
        .route("/weer", get(handlers::weer))
        .route("/zon", get(handlers::zon))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("zonnetijden listening on http://{}", addr);
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::http::{FetchError, JsonSource};
    use crate::location::{GeocodeResolver, PdokLocatieserver};
    use crate::snapshot::SourceError;
    use crate::solar::NoaaEphemeris;
    use crate::sun_times::SolarTimesService;
    use crate::water::{Station, WaterLevelSource, WaterReading, WaterSnapshotProvider};
    use crate::weather::WeatherSnapshotProvider;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Answers PDOK and weerlive from canned payloads, keyed on the URL.
    struct CannedUpstream;

    impl JsonSource for CannedUpstream {
        fn fetch_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
            if url.contains("pdok") {
                let q = query.iter().find(|(k, _)| *k == "q").map(|(_, v)| *v).unwrap_or("");
                let point = match q {
                    "zwolle" => Some("POINT(6.09937 52.51246)"),
                    "hattem" => Some("POINT(6.060676 52.479108)"),
                    _ => None,
                };
                if let Some(point) = point {
                    return Ok(json!({ "response": { "numFound": 1, "docs": [
                        { "centroide_ll": point }
                    ] } }));
                }
                return Ok(json!({ "response": { "numFound": 0, "docs": [] } }));
            }
            Ok(json!({
                "liveweer": [{ "temp": 4.3, "gtemp": 1.2, "samenv": "Bewolkt", "verw": "Koud",
                               "windr": "NW", "windbft": 3 }],
                "wk_verw": [
                    { "max_temp": 5, "min_temp": 1 }, { "max_temp": 7, "min_temp": 2 },
                    { "max_temp": 3, "min_temp": -1 }, { "max_temp": 5, "min_temp": 0 },
                    { "max_temp": 9, "min_temp": 4 }
                ],
                "api": [{ "bron": "Weerlive.nl" }]
            }))
        }
    }

    struct NoWater;

    impl WaterLevelSource for NoWater {
        fn fetch_water_level(&self, _station: &Station) -> Result<WaterReading, SourceError> {
            Ok(WaterReading { resultaat: "NOK".into(), nu: None, morgen: None })
        }
    }

    fn test_state() -> Arc<AppState> {
        let clock: Arc<dyn Clock> =
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 12, 21, 10, 0, 0).unwrap()));
        let upstream: Arc<dyn JsonSource> = Arc::new(CannedUpstream);
        Arc::new(AppState {
            solar: SolarTimesService::new(Arc::new(NoaaEphemeris)),
            geocoder: GeocodeResolver::new(Arc::new(PdokLocatieserver::new(upstream.clone())), clock.clone()),
            weather: WeatherSnapshotProvider::new(upstream, "test-key", clock.clone()),
            water: WaterSnapshotProvider::new(Arc::new(NoWater), clock.clone()),
            clock,
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_vandaag_overview() {
        let (status, body) = get_json("/vandaag").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plaats"], "Hattem");
        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0]["date"], "2024-11-23");
        assert_eq!(rows[2]["date"], "2024-12-21");
        assert_eq!(rows[2]["sunrise"], "08:44");
        assert_eq!(rows[2]["sunset"], "16:23");
        assert_eq!(rows[2]["day_length"], "7:38:43");
        assert_eq!(rows[4]["date"], "2025-01-18");
    }

    #[tokio::test]
    async fn test_weer_page() {
        let (status, body) = get_json("/weer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plaats"], "Hattem");
        assert_eq!(body["sunrise"], "08:44");
        assert_eq!(body["color"], "lawngreen");
        assert_eq!(body["weekday"], "zaterdag");
        assert_eq!(body["day"], "21");
        assert_eq!(body["weather"]["days"][1]["color"], "gold");
        assert_eq!(body["water"]["current_level"], "-");
        assert_eq!(body["water"]["current_color"], "red");
    }

    #[tokio::test]
    async fn test_zon_defaults() {
        let (status, body) = get_json("/zon").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plaats"], "Hattem");
        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 60);
        assert_eq!(rows[0]["date"], "2024-12-11");
        assert_eq!(rows[10]["sunrise"], "08:44:42");
    }

    #[tokio::test]
    async fn test_zon_without_plaats_geocodes_hattem() {
        let state = test_state();
        let app = build_router(state.clone());
        let response = app
            .oneshot(Request::builder().uri("/zon?terug=0&vooruit=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["plaats"], "Hattem");
        assert_eq!(state.geocoder.cached_queries(), 1);
        assert!(state.geocoder.resolve("Hattem").is_some());
    }

    #[tokio::test]
    async fn test_zon_non_numeric_terug() {
        let (_, body) = get_json("/zon?plaats=zwolle&terug=veel&vooruit=2").await;
        assert_eq!(body["plaats"], "Zwolle");
        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0]["date"], "2024-12-11");
    }

    #[tokio::test]
    async fn test_zon_unknown_place_falls_back() {
        let (_, body) = get_json("/zon?plaats=123456&terug=0&vooruit=1").await;
        assert_eq!(body["plaats"], "Hattem (default)");
        assert_eq!(body["rows"].as_array().unwrap().len(), 1);
        assert_eq!(body["rows"][0]["sunset"], "16:23:26");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/nergens").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
