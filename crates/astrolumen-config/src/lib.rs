use anyhow::Context;
use astrolumen::aspects::OrbConfig;
use astrolumen::search::{SearchSettings, DEFAULT_MAX_ITERATIONS, DEFAULT_STEP_HOURS, DEFAULT_TOLERANCE_DEG};
use astrolumen::locate::Zone;
use astrolumen::{IanaTimezones, StaticGeocoder};
use chrono::Duration;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Relative locations tried when no explicit config path is given.
pub const CONFIG_PATHS: [&str; 2] = ["configs/astrolumen.toml", "../../configs/astrolumen.toml"];

pub const DEFAULT_GEOCODE_CACHE_CAPACITY: usize = 256;
pub const DEFAULT_TIMEZONE_CACHE_CAPACITY: usize = 2048;

/// One gazetteer entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceEntry {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    /// IANA id or fixed offset; pins the zone for coordinates near this place
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstroSettings {
    pub app_name: String,
    pub mock_mode: bool,
    pub ephemeris_path: Option<PathBuf>,
    pub geocode_cache_capacity: usize,
    pub timezone_cache_capacity: usize,
    /// `None` keeps cached lookups until evicted
    pub cache_ttl_seconds: Option<u64>,
    pub orbs: OrbConfig,
    pub search: SearchSettings,
    pub places: Vec<PlaceEntry>,
}

impl Default for AstroSettings {
    fn default() -> Self {
        Self {
            app_name: "AstroLumen".to_string(),
            mock_mode: false,
            ephemeris_path: None,
            geocode_cache_capacity: DEFAULT_GEOCODE_CACHE_CAPACITY,
            timezone_cache_capacity: DEFAULT_TIMEZONE_CACHE_CAPACITY,
            cache_ttl_seconds: None,
            orbs: OrbConfig::default(),
            search: SearchSettings::default(),
            places: Vec::new(),
        }
    }
}

impl AstroSettings {
    /// Gazetteer built from `[[places]]`
    pub fn geocoder(&self) -> StaticGeocoder {
        let mut geocoder = StaticGeocoder::new();
        for place in &self.places {
            geocoder.insert(&place.name, place.latitude, place.longitude, place.address.as_deref());
        }
        geocoder
    }

    /// Built-in zone anchors plus one per place that names its timezone
    pub fn timezones(&self) -> anyhow::Result<IanaTimezones> {
        let mut zones = IanaTimezones::new();
        for place in &self.places {
            if let Some(zone) = &place.timezone {
                zones = zones
                    .with_zone(zone, place.latitude, place.longitude)
                    .with_context(|| format!("Place {:?} has an unusable timezone", place.name))?;
            }
        }
        Ok(zones)
    }

    /// Lifetime of cached lookups, `None` when entries never expire
    pub fn cache_ttl(&self) -> anyhow::Result<Option<Duration>> {
        self.cache_ttl_seconds.map(ttl_duration).transpose()
    }
}

fn ttl_duration(secs: u64) -> anyhow::Result<Duration> {
    Duration::from_std(std::time::Duration::from_secs(secs))
        .map_err(|_| anyhow::anyhow!("cache_ttl_seconds {secs} is out of range"))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchToml {
    #[serde(default)]
    step_hours: Option<i64>,
    #[serde(default)]
    tolerance_deg: Option<f64>,
    #[serde(default)]
    max_iterations: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SettingsToml {
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    mock_mode: bool,
    #[serde(default)]
    ephemeris_path: Option<PathBuf>,
    #[serde(default)]
    geocode_cache_capacity: Option<usize>,
    #[serde(default)]
    timezone_cache_capacity: Option<usize>,
    #[serde(default)]
    cache_ttl_seconds: Option<u64>,
    #[serde(default)]
    orbs: OrbConfig,
    #[serde(default)]
    search: SearchToml,
    #[serde(default)]
    places: Vec<PlaceEntry>,
}

/// Read the explicit path, or the first readable of [`CONFIG_PATHS`].
/// Ok(None) when no default location exists.
pub fn read_settings_text(explicit: Option<&Path>) -> anyhow::Result<Option<String>> {
    if let Some(path) = explicit {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read settings from {}", path.display()))?;
        return Ok(Some(text));
    }
    Ok(CONFIG_PATHS.iter().find_map(|p| fs::read_to_string(p).ok()))
}

pub fn parse_settings(text: &str) -> anyhow::Result<AstroSettings> {
    let raw: SettingsToml = toml::from_str(text)
        .map_err(|e| anyhow::anyhow!("Failed to parse astrolumen settings: {e}"))?;
    let SettingsToml {
        app_name,
        mock_mode,
        ephemeris_path,
        geocode_cache_capacity,
        timezone_cache_capacity,
        cache_ttl_seconds,
        orbs,
        search,
        places,
    } = raw;

    let step_hours = search.step_hours.unwrap_or(DEFAULT_STEP_HOURS);
    if step_hours <= 0 {
        anyhow::bail!("search.step_hours must be positive, got {step_hours}");
    }
    let tolerance_deg = search.tolerance_deg.unwrap_or(DEFAULT_TOLERANCE_DEG);
    if !(tolerance_deg > 0.0) {
        anyhow::bail!("search.tolerance_deg must be positive, got {tolerance_deg}");
    }
    for (kind, orb) in orbs.enabled() {
        if !(orb >= 0.0) {
            anyhow::bail!("orbs.{kind:?} must be non-negative, got {orb}");
        }
    }
    if let Some(secs) = cache_ttl_seconds {
        ttl_duration(secs)?;
    }
    for place in &places {
        if let Some(zone) = &place.timezone {
            if Zone::parse(zone).is_none() {
                anyhow::bail!("Place {:?} has an unknown timezone {zone:?}", place.name);
            }
        }
        if !(-90.0..=90.0).contains(&place.latitude) || !(-180.0..=180.0).contains(&place.longitude) {
            anyhow::bail!(
                "Place {:?} has out-of-range coordinates ({}, {})",
                place.name,
                place.latitude,
                place.longitude
            );
        }
    }

    Ok(AstroSettings {
        app_name: app_name.unwrap_or_else(|| "AstroLumen".to_string()),
        mock_mode,
        ephemeris_path,
        geocode_cache_capacity: geocode_cache_capacity.unwrap_or(DEFAULT_GEOCODE_CACHE_CAPACITY),
        timezone_cache_capacity: timezone_cache_capacity.unwrap_or(DEFAULT_TIMEZONE_CACHE_CAPACITY),
        cache_ttl_seconds,
        orbs,
        search: SearchSettings {
            step: Duration::hours(step_hours),
            tolerance_deg,
            max_iterations: search.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
        },
        places,
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Apply `ASTRO_*` overrides; `lookup` is `std::env::var` outside tests.
pub fn apply_env_overrides<F>(mut settings: AstroSettings, lookup: F) -> anyhow::Result<AstroSettings>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("ASTRO_MOCK_MODE") {
        settings.mock_mode = is_truthy(&value);
    }
    if let Some(value) = lookup("ASTRO_EPHEMERIS_PATH") {
        settings.ephemeris_path = (!value.trim().is_empty()).then(|| PathBuf::from(value.trim()));
    }
    if let Some(value) = lookup("ASTRO_GEOCODE_CACHE_CAPACITY") {
        settings.geocode_cache_capacity = value
            .trim()
            .parse()
            .with_context(|| format!("ASTRO_GEOCODE_CACHE_CAPACITY is not a count: {value:?}"))?;
    }
    if let Some(value) = lookup("ASTRO_TIMEZONE_CACHE_CAPACITY") {
        settings.timezone_cache_capacity = value
            .trim()
            .parse()
            .with_context(|| format!("ASTRO_TIMEZONE_CACHE_CAPACITY is not a count: {value:?}"))?;
    }
    if let Some(value) = lookup("ASTRO_CACHE_TTL_SECONDS") {
        let secs: u64 = value
            .trim()
            .parse()
            .with_context(|| format!("ASTRO_CACHE_TTL_SECONDS is not a count: {value:?}"))?;
        ttl_duration(secs)?;
        settings.cache_ttl_seconds = Some(secs);
    }
    Ok(settings)
}

/// Settings file (or defaults) plus environment overrides.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<AstroSettings> {
    let settings = match read_settings_text(explicit)? {
        Some(text) => parse_settings(&text)?,
        None => AstroSettings::default(),
    };
    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrolumen::aspects::AspectKind;
    use astrolumen::{Geocoder, TimezoneResolver};
    use std::collections::HashMap;
    use std::io::Write;

    const SAMPLE: &str = r#"
app_name = "Chart Desk"
mock_mode = true
geocode_cache_capacity = 16
cache_ttl_seconds = 3600

[orbs]
conjunction = 10.0
quincunx = 3.0

[search]
step_hours = 4
max_iterations = 30

[[places]]
name = "Recife"
latitude = -8.05
longitude = -34.9
address = "Recife, Pernambuco, Brasil"
timezone = "America/Recife"
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_full_settings() {
        let settings = parse_settings(SAMPLE).unwrap();
        assert_eq!(settings.app_name, "Chart Desk");
        assert!(settings.mock_mode);
        assert_eq!(settings.geocode_cache_capacity, 16);
        assert_eq!(settings.timezone_cache_capacity, DEFAULT_TIMEZONE_CACHE_CAPACITY);
        assert_eq!(settings.cache_ttl_seconds, Some(3600));
        assert_eq!(settings.orbs.orb_for(AspectKind::Conjunction), Some(10.0));
        assert_eq!(settings.orbs.orb_for(AspectKind::Square), Some(6.0));
        assert_eq!(settings.orbs.orb_for(AspectKind::Quincunx), Some(3.0));
        assert_eq!(settings.orbs.orb_for(AspectKind::Quintile), None);
        assert_eq!(settings.search.step, Duration::hours(4));
        assert_eq!(settings.search.max_iterations, 30);
        assert_eq!(settings.search.tolerance_deg, DEFAULT_TOLERANCE_DEG);
        assert_eq!(settings.places.len(), 1);
        assert_eq!(settings.cache_ttl().unwrap(), Some(Duration::hours(1)));
    }

    #[test]
    fn test_rejects_ttl_beyond_duration_range() {
        // largest TOML integer; fits u64 but not a chrono duration
        let err = parse_settings("cache_ttl_seconds = 9223372036854775807").unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
        assert!(parse_settings("cache_ttl_seconds = 31536000").is_ok());

        let settings = AstroSettings {
            cache_ttl_seconds: Some(u64::MAX),
            ..AstroSettings::default()
        };
        assert!(settings.cache_ttl().is_err());
        assert_eq!(AstroSettings::default().cache_ttl().unwrap(), None);

        let bad = apply_env_overrides(AstroSettings::default(), |k| {
            (k == "ASTRO_CACHE_TTL_SECONDS").then(|| u64::MAX.to_string())
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_place_timezones_become_anchors() {
        let settings = parse_settings(SAMPLE).unwrap();
        let zones = settings.timezones().unwrap();
        assert_eq!(zones.len(), IanaTimezones::new().len() + 1);
        let location = astrolumen::GeoLocation { lat: -8.05, lon: -34.9 };
        assert_eq!(zones.resolve_timezone(location).unwrap(), "America/Recife");

        let bad = "[[places]]\nname = \"X\"\nlatitude = 0.0\nlongitude = 0.0\ntimezone = \"Mars/Olympus\"";
        assert!(parse_settings(bad).is_err());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse_settings("").unwrap(), AstroSettings::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse_settings("[search]\nstep_hours = 0").is_err());
        assert!(parse_settings("[search]\nstep_minutes = 5").is_err());
        assert!(parse_settings("[orbs]\ntrine = -1.0").is_err());
        assert!(parse_settings("[[places]]\nname = \"X\"\nlatitude = 91.0\nlongitude = 0.0").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ASTRO_MOCK_MODE", "Yes"),
            ("ASTRO_EPHEMERIS_PATH", "/opt/ephe"),
            ("ASTRO_TIMEZONE_CACHE_CAPACITY", "12"),
        ]
        .into_iter()
        .collect();
        let settings = apply_env_overrides(AstroSettings::default(), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert!(settings.mock_mode);
        assert_eq!(settings.ephemeris_path, Some(PathBuf::from("/opt/ephe")));
        assert_eq!(settings.timezone_cache_capacity, 12);
        assert_eq!(settings.geocode_cache_capacity, DEFAULT_GEOCODE_CACHE_CAPACITY);

        let unchanged = apply_env_overrides(AstroSettings::default(), no_env).unwrap();
        assert_eq!(unchanged, AstroSettings::default());

        let bad = apply_env_overrides(AstroSettings::default(), |k| {
            (k == "ASTRO_GEOCODE_CACHE_CAPACITY").then(|| "lots".to_string())
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let text = read_settings_text(Some(file.path())).unwrap().unwrap();
        let settings = parse_settings(&text).unwrap();
        let place = settings.geocoder().geocode("recife").unwrap();
        assert_eq!(place.address, "Recife, Pernambuco, Brasil");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(read_settings_text(Some(missing.as_path())).is_err());
        assert!(load_settings(Some(missing.as_path())).is_err());
    }
}
