use crate::ephemeris::GeoLocation;
use crate::error::ChartError;
use crate::locate::cache::{BoundedCache, Clock};
use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::{Arc, Mutex};

lazy_static::lazy_static! {
    static ref UTC_ALIAS: Regex = Regex::new(r"^(?:UTC|GMT|Z|Etc/UTC|Etc/GMT)$").expect("valid pattern");
    static ref ETC_GMT: Regex = Regex::new(r"^Etc/GMT([+-])(\d{1,2})$").expect("valid pattern");
    static ref NUMERIC_OFFSET: Regex =
        Regex::new(r"^(?:UTC|GMT)?([+-])(\d{2}):?(\d{2})$").expect("valid pattern");
}

/// Mean Earth radius used for anchor distances
const EARTH_RADIUS_KM: f64 = 6371.0;
/// Anchors farther than this do not claim a point
pub const DEFAULT_ANCHOR_RADIUS_KM: f64 = 1000.0;

/// Representative points for IANA zones. Nearest anchor wins.
const BUILTIN_ANCHORS: &[(&str, f64, f64)] = &[
    // Brazil
    ("America/Sao_Paulo", -23.55, -46.63),
    ("America/Sao_Paulo", -22.91, -43.17),
    ("America/Sao_Paulo", -19.92, -43.94),
    ("America/Sao_Paulo", -25.43, -49.27),
    ("America/Sao_Paulo", -30.03, -51.23),
    ("America/Sao_Paulo", -15.79, -47.88),
    ("America/Bahia", -12.97, -38.50),
    ("America/Recife", -8.05, -34.90),
    ("America/Maceio", -9.67, -35.74),
    ("America/Fortaleza", -3.72, -38.54),
    ("America/Belem", -1.46, -48.50),
    ("America/Araguaina", -7.19, -48.21),
    ("America/Manaus", -3.12, -60.02),
    ("America/Cuiaba", -15.60, -56.10),
    ("America/Campo_Grande", -20.44, -54.65),
    ("America/Porto_Velho", -8.76, -63.90),
    ("America/Rio_Branco", -9.97, -67.81),
    ("America/Noronha", -3.85, -32.42),
    // Rest of the Americas
    ("America/Argentina/Buenos_Aires", -34.60, -58.38),
    ("America/Montevideo", -34.90, -56.16),
    ("America/Santiago", -33.45, -70.67),
    ("America/Asuncion", -25.26, -57.58),
    ("America/La_Paz", -16.50, -68.15),
    ("America/Lima", -12.05, -77.04),
    ("America/Bogota", 4.71, -74.07),
    ("America/Caracas", 10.48, -66.90),
    ("America/Havana", 23.11, -82.37),
    ("America/Mexico_City", 19.43, -99.13),
    ("America/New_York", 40.71, -74.01),
    ("America/Toronto", 43.65, -79.38),
    ("America/Halifax", 44.65, -63.57),
    ("America/Chicago", 41.88, -87.63),
    ("America/Denver", 39.74, -104.99),
    ("America/Phoenix", 33.45, -112.07),
    ("America/Los_Angeles", 34.05, -118.24),
    ("America/Vancouver", 49.28, -123.12),
    ("America/Anchorage", 61.22, -149.90),
    ("Pacific/Honolulu", 21.31, -157.86),
    // Europe
    ("Europe/Lisbon", 38.72, -9.14),
    ("Europe/Madrid", 40.42, -3.70),
    ("Europe/London", 51.51, -0.13),
    ("Europe/Paris", 48.86, 2.35),
    ("Europe/Amsterdam", 52.37, 4.90),
    ("Europe/Berlin", 52.52, 13.40),
    ("Europe/Rome", 41.90, 12.50),
    ("Europe/Stockholm", 59.33, 18.07),
    ("Europe/Warsaw", 52.23, 21.01),
    ("Europe/Athens", 37.98, 23.73),
    ("Europe/Istanbul", 41.01, 28.98),
    ("Europe/Moscow", 55.76, 37.62),
    // Africa
    ("Africa/Casablanca", 33.57, -7.59),
    ("Africa/Lagos", 6.52, 3.38),
    ("Africa/Luanda", -8.84, 13.23),
    ("Africa/Cairo", 30.04, 31.24),
    ("Africa/Nairobi", -1.29, 36.82),
    ("Africa/Johannesburg", -26.20, 28.05),
    ("Africa/Maputo", -25.97, 32.57),
    // Asia
    ("Asia/Dubai", 25.20, 55.27),
    ("Asia/Tehran", 35.69, 51.39),
    ("Asia/Karachi", 24.86, 67.00),
    ("Asia/Kolkata", 28.61, 77.21),
    ("Asia/Dhaka", 23.81, 90.41),
    ("Asia/Bangkok", 13.76, 100.50),
    ("Asia/Singapore", 1.35, 103.82),
    ("Asia/Jakarta", -6.20, 106.85),
    ("Asia/Manila", 14.60, 120.98),
    ("Asia/Hong_Kong", 22.32, 114.17),
    ("Asia/Shanghai", 31.23, 121.47),
    ("Asia/Seoul", 37.57, 126.98),
    ("Asia/Tokyo", 35.68, 139.69),
    // Oceania
    ("Australia/Perth", -31.95, 115.86),
    ("Australia/Adelaide", -34.93, 138.60),
    ("Australia/Brisbane", -27.47, 153.03),
    ("Australia/Sydney", -33.87, 151.21),
    ("Pacific/Auckland", -36.85, 174.76),
];

/// Coordinates -> zone id, and conversions through a zone id
pub trait TimezoneResolver: Send + Sync {
    /// Fails with [`ChartError::TimezoneNotFound`] when no zone covers the point.
    fn resolve_timezone(&self, location: GeoLocation) -> Result<String, ChartError>;

    /// Fails with [`ChartError::UnknownTimezone`] for an unrecognized zone id.
    fn local_to_utc(&self, local: NaiveDateTime, zone: &str) -> Result<DateTime<Utc>, ChartError>;

    fn utc_to_local(&self, utc: DateTime<Utc>, zone: &str) -> Result<NaiveDateTime, ChartError>;
}

/// Attach `tz` to a wall-clock time. Folds resolve to the earlier instant;
/// gaps are an error.
pub fn localize<Z: TimeZone>(
    tz: &Z,
    local: NaiveDateTime,
    zone: &str,
) -> Result<DateTime<Utc>, ChartError> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(ChartError::NonexistentLocalTime {
            local,
            zone: zone.to_string(),
        }),
    }
}

/// Parse zone ids with a fixed offset: `UTC`, `Etc/GMT+3` (POSIX sign, i.e.
/// UTC-3), `+05:30`, `UTC-0300`.
pub fn parse_fixed_zone(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    if UTC_ALIAS.is_match(zone) {
        return FixedOffset::east_opt(0);
    }
    if let Some(caps) = ETC_GMT.captures(zone) {
        let hours: i32 = caps[2].parse().ok()?;
        if hours > 14 {
            return None;
        }
        let east = if &caps[1] == "+" { -hours } else { hours };
        return FixedOffset::east_opt(east * 3600);
    }
    if let Some(caps) = NUMERIC_OFFSET.captures(zone) {
        let hours: i32 = caps[2].parse().ok()?;
        let minutes: i32 = caps[3].parse().ok()?;
        if hours > 14 || minutes >= 60 {
            return None;
        }
        let sign = if &caps[1] == "-" { -1 } else { 1 };
        return FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60));
    }
    None
}

/// A parsed zone id: an IANA zone with its DST history, or a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Zone {
    /// IANA ids first, then the fixed-offset forms of [`parse_fixed_zone`].
    pub fn parse(zone: &str) -> Option<Self> {
        let zone = zone.trim();
        match zone.parse::<Tz>() {
            Ok(tz) => Some(Zone::Named(tz)),
            Err(_) => parse_fixed_zone(zone).map(Zone::Fixed),
        }
    }

    /// `id` is reported back in errors.
    pub fn to_utc(&self, local: NaiveDateTime, id: &str) -> Result<DateTime<Utc>, ChartError> {
        match self {
            Zone::Named(tz) => localize(tz, local, id),
            Zone::Fixed(offset) => localize(offset, local, id),
        }
    }

    pub fn to_local(&self, utc: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::Named(tz) => utc.with_timezone(tz).naive_local(),
            Zone::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        }
    }
}

fn zone_or_unknown(zone: &str) -> Result<Zone, ChartError> {
    Zone::parse(zone).ok_or_else(|| ChartError::UnknownTimezone {
        zone: zone.to_string(),
    })
}

/// Zone id for a whole-hour offset east of UTC
fn etc_zone_id(hours_east: i32) -> String {
    match hours_east {
        0 => "UTC".to_string(),
        h if h > 0 => format!("Etc/GMT-{}", h),
        h => format!("Etc/GMT+{}", -h),
    }
}

/// Great-circle distance in kilometres
fn haversine_km(a: GeoLocation, b: GeoLocation) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[derive(Debug, Clone, PartialEq)]
struct ZoneAnchor {
    zone: String,
    location: GeoLocation,
}

/// Offline resolver backed by the IANA database.
///
/// Coordinates resolve to the zone of the nearest anchor point within
/// `radius_km`; anything farther (open ocean, uncovered regions) falls back to
/// the nautical zone `Etc/GMT±N` for its longitude. Conversions accept IANA
/// ids and the fixed-offset forms.
#[derive(Debug, Clone)]
pub struct IanaTimezones {
    anchors: Vec<ZoneAnchor>,
    radius_km: f64,
}

impl Default for IanaTimezones {
    fn default() -> Self {
        Self::new()
    }
}

impl IanaTimezones {
    /// Built-in anchors for major cities
    pub fn new() -> Self {
        let anchors = BUILTIN_ANCHORS
            .iter()
            .filter_map(|&(zone, lat, lon)| match zone.parse::<Tz>() {
                Ok(tz) => Some(ZoneAnchor {
                    zone: tz.name().to_string(),
                    location: GeoLocation { lat, lon },
                }),
                Err(_) => {
                    log::warn!("Skipping unknown built-in zone {}", zone);
                    None
                }
            })
            .collect();
        Self {
            anchors,
            radius_km: DEFAULT_ANCHOR_RADIUS_KM,
        }
    }

    /// No anchors: every point gets its nautical zone.
    pub fn empty() -> Self {
        Self {
            anchors: Vec::new(),
            radius_km: DEFAULT_ANCHOR_RADIUS_KM,
        }
    }

    /// Add an anchor. Fails with [`ChartError::UnknownTimezone`] when `zone`
    /// does not parse.
    pub fn with_zone(mut self, zone: &str, lat: f64, lon: f64) -> Result<Self, ChartError> {
        zone_or_unknown(zone)?;
        self.anchors.push(ZoneAnchor {
            zone: zone.trim().to_string(),
            location: GeoLocation { lat, lon },
        });
        Ok(self)
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    fn nearest_anchor(&self, location: GeoLocation) -> Option<&ZoneAnchor> {
        self.anchors
            .iter()
            .map(|anchor| (haversine_km(anchor.location, location), anchor))
            .filter(|(distance, _)| *distance <= self.radius_km)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, anchor)| anchor)
    }
}

impl TimezoneResolver for IanaTimezones {
    fn resolve_timezone(&self, location: GeoLocation) -> Result<String, ChartError> {
        let GeoLocation { lat, lon } = location;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(ChartError::TimezoneNotFound { lat, lon });
        }
        if let Some(anchor) = self.nearest_anchor(location) {
            return Ok(anchor.zone.clone());
        }
        let hours_east = (lon / 15.0).round() as i32;
        let zone = etc_zone_id(hours_east.clamp(-12, 12));
        log::debug!("No zone anchor near ({}, {}); using nautical {}", lat, lon, zone);
        Ok(zone)
    }

    fn local_to_utc(&self, local: NaiveDateTime, zone: &str) -> Result<DateTime<Utc>, ChartError> {
        zone_or_unknown(zone)?.to_utc(local, zone)
    }

    fn utc_to_local(&self, utc: DateTime<Utc>, zone: &str) -> Result<NaiveDateTime, ChartError> {
        Ok(zone_or_unknown(zone)?.to_local(utc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordinateKey(u64, u64);

impl From<GeoLocation> for CoordinateKey {
    fn from(loc: GeoLocation) -> Self {
        CoordinateKey(loc.lat.to_bits(), loc.lon.to_bits())
    }
}

/// Memoizing wrapper for zone resolution keyed by exact coordinates.
/// Conversions are passed through uncached.
pub struct CachedTimezoneResolver<T> {
    inner: T,
    cache: Mutex<BoundedCache<CoordinateKey, String>>,
}

impl<T: TimezoneResolver> CachedTimezoneResolver<T> {
    pub fn new(inner: T, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    pub fn with_ttl(self, ttl: Option<Duration>) -> Self {
        self.map_cache(|cache| cache.with_ttl(ttl))
    }

    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        self.map_cache(|cache| cache.with_clock(clock))
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn map_cache(
        self,
        f: impl FnOnce(BoundedCache<CoordinateKey, String>) -> BoundedCache<CoordinateKey, String>,
    ) -> Self {
        let cache = self.cache.into_inner().unwrap_or_else(|e| e.into_inner());
        Self {
            inner: self.inner,
            cache: Mutex::new(f(cache)),
        }
    }
}

impl<T: TimezoneResolver> TimezoneResolver for CachedTimezoneResolver<T> {
    fn resolve_timezone(&self, location: GeoLocation) -> Result<String, ChartError> {
        let key = CoordinateKey::from(location);
        let hit = self.cache.lock().unwrap_or_else(|e| e.into_inner()).get(&key);
        if let Some(zone) = hit {
            log::debug!("Timezone cache hit: ({}, {}) -> {}", location.lat, location.lon, zone);
            return Ok(zone);
        }

        let zone = self.inner.resolve_timezone(location)?;
        log::info!("Timezone resolved: ({}, {}) -> {}", location.lat, location.lon, zone);
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, zone.clone());
        Ok(zone)
    }

    fn local_to_utc(&self, local: NaiveDateTime, zone: &str) -> Result<DateTime<Utc>, ChartError> {
        self.inner.local_to_utc(local, zone)
    }

    fn utc_to_local(&self, utc: DateTime<Utc>, zone: &str) -> Result<NaiveDateTime, ChartError> {
        self.inner.utc_to_local(utc, zone)
    }
}
