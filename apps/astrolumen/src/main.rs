mod cli;

use astrolumen::{
    CachedGeocoder, CachedTimezoneResolver, ChartAssembler, HouseSystemProvider,
    MeanMotionEphemeris, PositionProvider,
};
use astrolumen_config::{load_settings, AstroSettings};
use clap::Parser;
use cli::{Args, Command};
use serde_json::Value;
use std::sync::Arc;

type Backends = (Arc<dyn PositionProvider>, Arc<dyn HouseSystemProvider>);

fn mean_motion() -> Backends {
    let mock = Arc::new(MeanMotionEphemeris::new());
    let positions: Arc<dyn PositionProvider> = mock.clone();
    let houses: Arc<dyn HouseSystemProvider> = mock;
    (positions, houses)
}

#[cfg(feature = "swisseph")]
fn ephemeris_backends(settings: &AstroSettings) -> anyhow::Result<Backends> {
    if settings.mock_mode {
        log::info!("Mock mode: using mean-motion ephemeris");
        return Ok(mean_motion());
    }
    let swiss = Arc::new(
        astrolumen::SwissEphemeris::new(settings.ephemeris_path.clone())
            .map_err(|e| anyhow::anyhow!("Failed to open Swiss Ephemeris: {e}"))?,
    );
    let positions: Arc<dyn PositionProvider> = swiss.clone();
    let houses: Arc<dyn HouseSystemProvider> = swiss;
    Ok((positions, houses))
}

#[cfg(not(feature = "swisseph"))]
fn ephemeris_backends(settings: &AstroSettings) -> anyhow::Result<Backends> {
    if !settings.mock_mode {
        log::warn!("Built without Swiss Ephemeris; falling back to mean-motion positions");
    }
    Ok(mean_motion())
}

fn build_assembler(settings: &AstroSettings) -> anyhow::Result<ChartAssembler> {
    let (positions, houses) = ephemeris_backends(settings)?;
    let ttl = settings.cache_ttl()?;
    let geocoder = CachedGeocoder::new(settings.geocoder(), settings.geocode_cache_capacity).with_ttl(ttl);
    let timezones = CachedTimezoneResolver::new(settings.timezones()?, settings.timezone_cache_capacity)
        .with_ttl(ttl);
    Ok(
        ChartAssembler::new(positions, houses, Arc::new(geocoder), Arc::new(timezones))
            .with_search(settings.search),
    )
}

fn run(command: Command, assembler: &ChartAssembler, settings: &AstroSettings) -> anyhow::Result<Value> {
    let value = match command {
        Command::Natal(chart) => {
            let request = chart.into_request(&settings.orbs);
            serde_json::to_value(assembler.natal_chart(&request)?)?
        }
        Command::SolarReturn { chart, year } => {
            let request = cli::solar_return_request(chart, year, &settings.orbs);
            serde_json::to_value(assembler.solar_return(&request)?)?
        }
        Command::Progression { chart, target_date } => {
            let request = cli::progression_request(chart, target_date, &settings.orbs);
            serde_json::to_value(assembler.progression(&request)?)?
        }
        Command::Lunation {
            date,
            phase,
            zodiac,
            sidereal_mode,
        } => {
            let request = cli::lunation_request(date, phase, zodiac, sidereal_mode);
            serde_json::to_value(assembler.lunation(&request)?)?
        }
    };
    Ok(value)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if args.mock {
        settings.mock_mode = true;
    }
    log::debug!("{} settings: {:?}", settings.app_name, settings);

    let assembler = build_assembler(&settings)?;
    let output = run(args.command, &assembler, &settings).map_err(|e| {
        log::error!("{e:#}");
        e
    })?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
