use crate::aspects::OrbConfig;
use crate::ephemeris::{HouseSystem, ZodiacKind, ZodiacMode};
use crate::error::ChartError;
use crate::western::Language;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

fn default_house_system() -> String {
    "P".to_string()
}

/// Birth (or reference) moment and place for one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    pub birth_date: NaiveDate,
    /// Local wall-clock time at the birth place
    pub birth_time: NaiveTime,
    pub place: String,
    #[serde(default)]
    pub language: Language,
    /// Single-letter house system code
    #[serde(default = "default_house_system")]
    pub house_system: String,
    #[serde(default)]
    pub zodiac: ZodiacKind,
    /// Sidereal reference key; ignored for tropical charts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidereal_mode: Option<String>,
    #[serde(default)]
    pub orbs: OrbConfig,
}

impl ChartRequest {
    pub fn new(birth_date: NaiveDate, birth_time: NaiveTime, place: impl Into<String>) -> Self {
        Self {
            subject_name: None,
            birth_date,
            birth_time,
            place: place.into(),
            language: Language::default(),
            house_system: default_house_system(),
            zodiac: ZodiacKind::default(),
            sidereal_mode: None,
            orbs: OrbConfig::default(),
        }
    }

    pub fn local_datetime(&self) -> NaiveDateTime {
        self.birth_date.and_time(self.birth_time)
    }

    pub fn resolve_house_system(&self) -> Result<HouseSystem, ChartError> {
        HouseSystem::from_code(&self.house_system)
    }

    pub fn resolve_zodiac(&self) -> Result<ZodiacMode, ChartError> {
        ZodiacMode::resolve(self.zodiac, self.sidereal_mode.as_deref())
    }
}

/// Solar return for `year`, cast at the birth place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarReturnRequest {
    #[serde(flatten)]
    pub chart: ChartRequest,
    pub year: i32,
}

/// Secondary progression of the natal chart to `target_date`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRequest {
    #[serde(flatten)]
    pub chart: ChartRequest,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LunationPhase {
    New,
    Full,
}

impl LunationPhase {
    /// Moon-Sun elongation at this phase
    pub fn target_angle(self) -> f64 {
        match self {
            LunationPhase::New => 0.0,
            LunationPhase::Full => 180.0,
        }
    }
}

/// Next lunation of `phase` within 30 days of `reference_date` (00:00 UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LunationRequest {
    pub reference_date: NaiveDate,
    pub phase: LunationPhase,
    #[serde(default)]
    pub zodiac: ZodiacKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidereal_mode: Option<String>,
}

impl LunationRequest {
    pub fn new(reference_date: NaiveDate, phase: LunationPhase) -> Self {
        Self {
            reference_date,
            phase,
            zodiac: ZodiacKind::default(),
            sidereal_mode: None,
        }
    }

    pub fn resolve_zodiac(&self) -> Result<ZodiacMode, ChartError> {
        ZodiacMode::resolve(self.zodiac, self.sidereal_mode.as_deref())
    }
}
