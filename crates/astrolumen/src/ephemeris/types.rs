use crate::error::ChartError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic location coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Bodies tracked in every chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    #[serde(rename = "True Node")]
    TrueNode,
    Chiron,
}

impl Body {
    /// Chart order: luminaries, planets, node, Chiron.
    pub const TRACKED: [Body; 12] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
        Body::TrueNode,
        Body::Chiron,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
            Body::TrueNode => "True Node",
            Body::Chiron => "Chiron",
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ecliptic position of a body at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipticPosition {
    /// Longitude in degrees (0-360)
    pub longitude: f64,
    /// Latitude in degrees
    pub latitude: f64,
    /// Speed in longitude (degrees per day); negative means retrograde
    pub speed: f64,
}

impl EclipticPosition {
    pub fn is_retrograde(&self) -> bool {
        self.speed < 0.0
    }
}

/// Sidereal reference frame ("ayanamsa")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ayanamsa {
    Lahiri,
    FaganBradley,
    Krishnamurti,
    Raman,
    DeLuce,
    Yukteshwar,
    DjwhalKhul,
    TrueCitra,
    TrueRevati,
    Aryabhata,
}

impl Ayanamsa {
    pub const ALL: [Ayanamsa; 10] = [
        Ayanamsa::Lahiri,
        Ayanamsa::FaganBradley,
        Ayanamsa::Krishnamurti,
        Ayanamsa::Raman,
        Ayanamsa::DeLuce,
        Ayanamsa::Yukteshwar,
        Ayanamsa::DjwhalKhul,
        Ayanamsa::TrueCitra,
        Ayanamsa::TrueRevati,
        Ayanamsa::Aryabhata,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Ayanamsa::Lahiri => "LAHIRI",
            Ayanamsa::FaganBradley => "FAGAN_BRADLEY",
            Ayanamsa::Krishnamurti => "KRISHNAMURTI",
            Ayanamsa::Raman => "RAMAN",
            Ayanamsa::DeLuce => "DELUCE",
            Ayanamsa::Yukteshwar => "YUKTESHWAR",
            Ayanamsa::DjwhalKhul => "DJWHAL_KHUL",
            Ayanamsa::TrueCitra => "TRUE_CITRA",
            Ayanamsa::TrueRevati => "TRUE_REVATI",
            Ayanamsa::Aryabhata => "ARYABHATA",
        }
    }

    /// Parse a reference key case-insensitively.
    pub fn from_key(key: &str) -> Result<Self, ChartError> {
        let wanted = key.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.key() == wanted)
            .ok_or_else(|| ChartError::InvalidAyanamsa {
                key: key.to_string(),
                valid: Self::ALL.iter().map(|a| a.key().to_string()).collect(),
            })
    }
}

/// Zodiac reference frame requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacKind {
    #[default]
    Tropical,
    Sidereal,
}

/// Resolved zodiac frame used for calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZodiacMode {
    #[default]
    Tropical,
    Sidereal(Ayanamsa),
}

impl ZodiacMode {
    /// Resolve the requested kind and optional sidereal key; Lahiri is the
    /// sidereal default. The key is ignored for tropical charts.
    pub fn resolve(kind: ZodiacKind, sidereal_key: Option<&str>) -> Result<Self, ChartError> {
        match kind {
            ZodiacKind::Tropical => Ok(ZodiacMode::Tropical),
            ZodiacKind::Sidereal => {
                let ayanamsa = match sidereal_key {
                    Some(key) => Ayanamsa::from_key(key)?,
                    None => Ayanamsa::Lahiri,
                };
                Ok(ZodiacMode::Sidereal(ayanamsa))
            }
        }
    }

    /// Flag recorded in chart metadata
    pub fn flag(self) -> String {
        match self {
            ZodiacMode::Tropical => "TROPICAL".to_string(),
            ZodiacMode::Sidereal(ayanamsa) => format!("SIDEREAL_MODE={}", ayanamsa.key()),
        }
    }
}

/// House division systems, identified by single-letter codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HouseSystem {
    Placidus,
    Koch,
    WholeSign,
    Porphyry,
    Regiomontanus,
    Campanus,
    Equal,
    Alcabitius,
    Morinus,
}

impl HouseSystem {
    pub const ALL: [HouseSystem; 9] = [
        HouseSystem::Placidus,
        HouseSystem::Koch,
        HouseSystem::WholeSign,
        HouseSystem::Porphyry,
        HouseSystem::Regiomontanus,
        HouseSystem::Campanus,
        HouseSystem::Equal,
        HouseSystem::Alcabitius,
        HouseSystem::Morinus,
    ];

    pub fn code(self) -> char {
        match self {
            HouseSystem::Placidus => 'P',
            HouseSystem::Koch => 'K',
            HouseSystem::WholeSign => 'W',
            HouseSystem::Porphyry => 'O',
            HouseSystem::Regiomontanus => 'R',
            HouseSystem::Campanus => 'C',
            HouseSystem::Equal => 'E',
            HouseSystem::Alcabitius => 'A',
            HouseSystem::Morinus => 'M',
        }
    }

    pub fn from_code(code: &str) -> Result<Self, ChartError> {
        let trimmed = code.trim();
        let mut chars = trimmed.chars();
        let found = match (chars.next(), chars.next()) {
            (Some(c), None) => Self::ALL
                .iter()
                .copied()
                .find(|hs| hs.code() == c.to_ascii_uppercase()),
            _ => None,
        };
        found.ok_or_else(|| ChartError::InvalidHouseSystem {
            code: code.to_string(),
            valid: Self::ALL.iter().map(|hs| hs.code().to_string()).collect(),
        })
    }
}

/// Raw output of a house-system provider
#[derive(Debug, Clone, PartialEq)]
pub struct HouseFrame {
    /// Cusp longitudes as returned by the provider (may carry a leading
    /// sentinel or be short; see [`crate::houses::normalize_cusps`])
    pub cusps: Vec<f64>,
    pub ascendant: f64,
    pub midheaven: f64,
    pub vertex: Option<f64>,
}

/// Source of body positions
pub trait PositionProvider: Send + Sync {
    fn position(
        &self,
        at: DateTime<Utc>,
        body: Body,
        zodiac: ZodiacMode,
    ) -> Result<EclipticPosition, ChartError>;

    /// Flag recorded in chart metadata describing the data source.
    fn source_flag(&self) -> String;
}

/// Source of house cusps and chart angles
pub trait HouseSystemProvider: Send + Sync {
    fn houses(
        &self,
        at: DateTime<Utc>,
        location: GeoLocation,
        system: HouseSystem,
        zodiac: ZodiacMode,
    ) -> Result<HouseFrame, ChartError>;
}
