use crate::ephemeris::GeoLocation;
use crate::error::ChartError;
use crate::locate::cache::{BoundedCache, Clock};
use chrono::Duration;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

lazy_static::lazy_static! {
    static ref COORDINATES: Regex =
        Regex::new(r"^\s*([+-]?\d{1,3}(?:\.\d+)?)\s*,\s*([+-]?\d{1,3}(?:\.\d+)?)\s*$")
            .expect("coordinate pattern is valid");
}

/// Result of resolving a place name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPlace {
    pub location: GeoLocation,
    /// Normalized address reported by the geocoder
    pub address: String,
}

/// Place name -> coordinates
pub trait Geocoder: Send + Sync {
    /// Fails with [`ChartError::PlaceNotFound`] when nothing matches.
    fn geocode(&self, place: &str) -> Result<GeocodedPlace, ChartError>;
}

/// Trim and collapse internal whitespace.
pub fn normalize_place(place: &str) -> String {
    place.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a `"lat, lon"` string into a location within valid ranges.
pub fn parse_coordinates(text: &str) -> Option<GeoLocation> {
    let caps = COORDINATES.captures(text)?;
    let lat: f64 = caps[1].parse().ok()?;
    let lon: f64 = caps[2].parse().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon))
        .then_some(GeoLocation { lat, lon })
}

/// Gazetteer backed geocoder with a coordinate-string fallback
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, GeocodedPlace>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, name: &str, lat: f64, lon: f64, address: Option<&str>) -> Self {
        self.insert(name, lat, lon, address);
        self
    }

    pub fn insert(&mut self, name: &str, lat: f64, lon: f64, address: Option<&str>) {
        let normalized = normalize_place(name);
        let place = GeocodedPlace {
            location: GeoLocation { lat, lon },
            address: address.map(str::to_string).unwrap_or_else(|| normalized.clone()),
        };
        self.entries.insert(normalized.to_lowercase(), place);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, place: &str) -> Result<GeocodedPlace, ChartError> {
        let normalized = normalize_place(place);
        if let Some(found) = self.entries.get(&normalized.to_lowercase()) {
            return Ok(found.clone());
        }
        parse_coordinates(&normalized)
            .map(|location| GeocodedPlace {
                location,
                address: normalized.clone(),
            })
            .ok_or(ChartError::PlaceNotFound { place: normalized })
    }
}

/// Memoizing wrapper keyed by the normalized place string.
///
/// Failures are not cached.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Mutex<BoundedCache<String, GeocodedPlace>>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, capacity: usize) -> Self {
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
        f: impl FnOnce(BoundedCache<String, GeocodedPlace>) -> BoundedCache<String, GeocodedPlace>,
    ) -> Self {
        let cache = self.cache.into_inner().unwrap_or_else(|e| e.into_inner());
        Self {
            inner: self.inner,
            cache: Mutex::new(f(cache)),
        }
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    fn geocode(&self, place: &str) -> Result<GeocodedPlace, ChartError> {
        let key = normalize_place(place);
        let hit = self.cache.lock().unwrap_or_else(|e| e.into_inner()).get(&key);
        if let Some(found) = hit {
            log::debug!("Geocode cache hit: {}", key);
            return Ok(found);
        }

        let resolved = self.inner.geocode(&key)?;
        log::info!(
            "Geocode resolved: {} -> ({:.4}, {:.4})",
            key,
            resolved.location.lat,
            resolved.location.lon
        );
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, resolved.clone());
        Ok(resolved)
    }
}
