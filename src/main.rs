use chrono::Utc;
use chrono_tz::Europe::Amsterdam;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zonnetijden::clock::{Clock, SystemClock};
use zonnetijden::config::{Config, DEFAULT_HOST, DEFAULT_PORT};
use zonnetijden::http::{JsonSource, UreqSource};
use zonnetijden::location::{GeocodeResolver, PdokLocatieserver, DEFAULT_PLACE};
use zonnetijden::server::{self, capitalize, AppState};
use zonnetijden::solar::NoaaEphemeris;
use zonnetijden::sun_times::SolarTimesService;
use zonnetijden::water::{HttpWaterLevels, WaterSnapshotProvider, DEFAULT_WATER_URL};
use zonnetijden::weather::WeatherSnapshotProvider;

/// Zonnetijden: sunrise, sunset, weather and river level for Hattem.
///
/// Examples:
///   zonnetijden serve --weer-api-key abc123
///   zonnetijden times --plaats Zwolle --date 2024-12-21 --seconds
#[derive(Parser)]
#[command(name = "zonnetijden", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (/vandaag, /weer, /zon).
    Serve {
        /// weerlive.nl API key.
        #[arg(long, env = "WEER_API_KEY", hide_env_values = true)]
        weer_api_key: Option<String>,

        #[arg(long, env = "ZONNETIJDEN_HOST", default_value = DEFAULT_HOST)]
        host: String,

        #[arg(long, env = "ZONNETIJDEN_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Water-level endpoint, queried with `locatie` and `code`.
        #[arg(long, env = "WATERSTAND_URL", default_value = DEFAULT_WATER_URL)]
        water_url: String,
    },

    /// Print sun times for one day as JSON.
    Times {
        /// Date (YYYY-MM-DD). Defaults to today in Amsterdam.
        #[arg(long, short = 'd')]
        date: Option<String>,

        /// Place name or postal code. Unknown places fall back to Hattem.
        #[arg(long, short = 'p', default_value = "Hattem")]
        plaats: String,

        /// Include seconds in sunrise and sunset.
        #[arg(long)]
        seconds: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zonnetijden=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve { weer_api_key, host, port, water_url } => {
            Config::new(weer_api_key, host, port, water_url)
                .map_err(|e| e.to_string())
                .and_then(serve)
        }
        Command::Times { date, plaats, seconds } => times(date, &plaats, seconds),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            tracing::error!("{}", msg);
            eprintln!("Error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

// ── Serve ───────────────────────────────────────────────────────

fn serve(config: Config) -> Result<(), String> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let upstream: Arc<dyn JsonSource> = Arc::new(UreqSource::default());

    let state = Arc::new(AppState {
        solar: SolarTimesService::new(Arc::new(NoaaEphemeris)),
        geocoder: GeocodeResolver::new(Arc::new(PdokLocatieserver::new(upstream.clone())), clock.clone()),
        weather: WeatherSnapshotProvider::new(upstream.clone(), config.weer_api_key.clone(), clock.clone()),
        water: WaterSnapshotProvider::new(
            Arc::new(HttpWaterLevels::new(upstream, config.water_url.clone())),
            clock.clone(),
        ),
        clock,
    });

    let runtime = tokio::runtime::Runtime::new().map_err(|e| format!("cannot start runtime: {}", e))?;
    runtime
        .block_on(server::start(&config.host, config.port, state))
        .map_err(|e| format!("server on {} failed: {}", config.bind_addr(), e))
}

// ── Times ───────────────────────────────────────────────────────

fn times(date: Option<String>, plaats: &str, seconds: bool) -> Result<(), String> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let upstream: Arc<dyn JsonSource> = Arc::new(UreqSource::default());
    let geocoder = GeocodeResolver::new(Arc::new(PdokLocatieserver::new(upstream)), clock);
    let solar = SolarTimesService::new(Arc::new(NoaaEphemeris));

    let requested = capitalize(plaats);
    let place = if requested == DEFAULT_PLACE.name {
        DEFAULT_PLACE.to_place()
    } else {
        geocoder.resolve_or_default(&requested)
    };
    let date = date.unwrap_or_else(|| Utc::now().with_timezone(&Amsterdam).format("%Y-%m-%d").to_string());

    let row = solar
        .compute_solar_times(&date, &place.name, place.coordinate.lat, place.coordinate.lon, seconds)
        .map_err(|e| e.to_string())?;

    eprintln!("  {} ({:.4}, {:.4})", place.name, place.coordinate.lat, place.coordinate.lon);
    let json = serde_json::to_string_pretty(&row).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}
