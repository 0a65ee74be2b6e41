use crate::aspects::AspectRecord;
use crate::ephemeris::{Body, ZodiacKind};
use crate::western::{to_sign_position, DignityResult, Language, SignPosition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    /// Address reported by the geocoder
    pub place: String,
    /// Local date, `YYYY-MM-DD`
    pub birth_date: String,
    /// Local time, `HH:MM:SS`
    pub birth_time: String,
    pub timezone: String,
    /// `YYYY-MM-DDTHH:MM:SSZ`
    pub utc_datetime: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zodiac: ZodiacKind,
    pub house_system: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidereal_mode: Option<String>,
    pub ephemeris_flags: Vec<String>,
    pub language: Language,
}

/// A chart point with its sign placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnglePoint {
    pub longitude: f64,
    #[serde(flatten)]
    pub position: SignPosition,
}

impl AnglePoint {
    pub fn at(longitude: f64) -> Self {
        Self {
            longitude: round6(longitude),
            position: to_sign_position(longitude),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoints {
    pub asc: AnglePoint,
    pub mc: AnglePoint,
    pub dc: AnglePoint,
    pub ic: AnglePoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex: Option<AnglePoint>,
    /// Part of Fortune
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fortune: Option<AnglePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseCusp {
    /// 1-12
    pub index: u8,
    pub longitude: f64,
    #[serde(flatten)]
    pub position: SignPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub name: Body,
    pub longitude: f64,
    pub latitude: f64,
    pub speed: f64,
    #[serde(flatten)]
    pub position: SignPosition,
    pub house: u8,
    /// Set when no cusp interval contained the body and `house` is the
    /// house-1 default
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub house_fallback: bool,
    pub retrograde: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dignities: Vec<DignityResult>,
}

/// A complete chart. Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub metadata: ChartMetadata,
    pub points: ChartPoints,
    pub houses: Vec<HouseCusp>,
    pub planets: Vec<PlanetPosition>,
    pub aspects: Vec<AspectRecord>,
    pub summary: Vec<String>,
}

impl ChartSnapshot {
    pub fn planet(&self, body: Body) -> Option<&PlanetPosition> {
        self.planets.iter().find(|p| p.name == body)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub(crate) fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
