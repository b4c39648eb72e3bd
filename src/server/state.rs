use crate::clock::Clock;
use crate::location::GeocodeResolver;
use crate::sun_times::SolarTimesService;
use crate::water::WaterSnapshotProvider;
use crate::weather::WeatherSnapshotProvider;
use std::sync::Arc;

/// Shared by every request. Each provider owns its own cache.
pub struct AppState {
    pub solar: SolarTimesService,
    pub geocoder: GeocodeResolver,
    pub weather: WeatherSnapshotProvider,
    pub water: WaterSnapshotProvider,
    pub clock: Arc<dyn Clock>,
}
