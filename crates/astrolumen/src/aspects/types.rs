use crate::ephemeris::Body;
use serde::{Deserialize, Serialize};

/// Aspect kinds, majors first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectKind {
    Conjunction,
    Opposition,
    Square,
    Trine,
    Sextile,
    Quincunx,
    Semisextile,
    Semisquare,
    Sesquiquadrate,
    Quintile,
    Biquintile,
}

impl AspectKind {
    /// Evaluation order
    pub const ALL: [AspectKind; 11] = [
        AspectKind::Conjunction,
        AspectKind::Opposition,
        AspectKind::Square,
        AspectKind::Trine,
        AspectKind::Sextile,
        AspectKind::Quincunx,
        AspectKind::Semisextile,
        AspectKind::Semisquare,
        AspectKind::Sesquiquadrate,
        AspectKind::Quintile,
        AspectKind::Biquintile,
    ];

    pub fn exact_angle(self) -> f64 {
        match self {
            AspectKind::Conjunction => 0.0,
            AspectKind::Opposition => 180.0,
            AspectKind::Square => 90.0,
            AspectKind::Trine => 120.0,
            AspectKind::Sextile => 60.0,
            AspectKind::Quincunx => 150.0,
            AspectKind::Semisextile => 30.0,
            AspectKind::Semisquare => 45.0,
            AspectKind::Sesquiquadrate => 135.0,
            AspectKind::Quintile => 72.0,
            AspectKind::Biquintile => 144.0,
        }
    }

    /// Orb used when the kind is enabled without an explicit value
    pub fn default_orb(self) -> f64 {
        match self {
            AspectKind::Conjunction | AspectKind::Opposition => 8.0,
            AspectKind::Square | AspectKind::Trine => 6.0,
            AspectKind::Sextile => 4.0,
            AspectKind::Quincunx => 3.0,
            _ => 2.0,
        }
    }

    pub fn is_major(self) -> bool {
        matches!(
            self,
            AspectKind::Conjunction
                | AspectKind::Opposition
                | AspectKind::Square
                | AspectKind::Trine
                | AspectKind::Sextile
        )
    }
}

/// Orb limit per aspect kind; a kind with no orb is not evaluated.
///
/// Missing fields take their defaults when deserializing, so a request may
/// override a single orb. Majors are enabled by default, minors are not; an
/// explicit `null` disables a kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    pub conjunction: Option<f64>,
    pub opposition: Option<f64>,
    pub square: Option<f64>,
    pub trine: Option<f64>,
    pub sextile: Option<f64>,
    pub quincunx: Option<f64>,
    pub semisextile: Option<f64>,
    pub semisquare: Option<f64>,
    pub sesquiquadrate: Option<f64>,
    pub quintile: Option<f64>,
    pub biquintile: Option<f64>,
}

impl Default for OrbConfig {
    fn default() -> Self {
        let mut config = Self::none();
        for kind in AspectKind::ALL.iter().copied().filter(|k| k.is_major()) {
            config.set(kind, Some(kind.default_orb()));
        }
        config
    }
}

impl OrbConfig {
    /// No kind enabled
    pub fn none() -> Self {
        Self {
            conjunction: None,
            opposition: None,
            square: None,
            trine: None,
            sextile: None,
            quincunx: None,
            semisextile: None,
            semisquare: None,
            sesquiquadrate: None,
            quintile: None,
            biquintile: None,
        }
    }

    /// Every kind enabled at its default orb
    pub fn all_defaults() -> Self {
        let mut config = Self::none();
        for kind in AspectKind::ALL {
            config.set(kind, Some(kind.default_orb()));
        }
        config
    }

    pub fn orb_for(&self, kind: AspectKind) -> Option<f64> {
        *self.slot(kind)
    }

    pub fn set(&mut self, kind: AspectKind, orb: Option<f64>) {
        *self.slot_mut(kind) = orb;
    }

    pub fn with_orb(mut self, kind: AspectKind, orb: f64) -> Self {
        self.set(kind, Some(orb));
        self
    }

    /// Enabled kinds with their orb, in evaluation order
    pub fn enabled(&self) -> impl Iterator<Item = (AspectKind, f64)> + '_ {
        AspectKind::ALL
            .iter()
            .filter_map(move |kind| self.orb_for(*kind).map(|orb| (*kind, orb)))
    }

    fn slot(&self, kind: AspectKind) -> &Option<f64> {
        match kind {
            AspectKind::Conjunction => &self.conjunction,
            AspectKind::Opposition => &self.opposition,
            AspectKind::Square => &self.square,
            AspectKind::Trine => &self.trine,
            AspectKind::Sextile => &self.sextile,
            AspectKind::Quincunx => &self.quincunx,
            AspectKind::Semisextile => &self.semisextile,
            AspectKind::Semisquare => &self.semisquare,
            AspectKind::Sesquiquadrate => &self.sesquiquadrate,
            AspectKind::Quintile => &self.quintile,
            AspectKind::Biquintile => &self.biquintile,
        }
    }

    fn slot_mut(&mut self, kind: AspectKind) -> &mut Option<f64> {
        match kind {
            AspectKind::Conjunction => &mut self.conjunction,
            AspectKind::Opposition => &mut self.opposition,
            AspectKind::Square => &mut self.square,
            AspectKind::Trine => &mut self.trine,
            AspectKind::Sextile => &mut self.sextile,
            AspectKind::Quincunx => &mut self.quincunx,
            AspectKind::Semisextile => &mut self.semisextile,
            AspectKind::Semisquare => &mut self.semisquare,
            AspectKind::Sesquiquadrate => &mut self.sesquiquadrate,
            AspectKind::Quintile => &mut self.quintile,
            AspectKind::Biquintile => &mut self.biquintile,
        }
    }
}

/// A body as seen by the aspect engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectBody {
    pub body: Body,
    pub longitude: f64,
    /// Degrees per day
    pub speed: f64,
}

/// One detected aspect between an unordered pair of bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectRecord {
    #[serde(rename = "planet1")]
    pub body_a: Body,
    #[serde(rename = "planet2")]
    pub body_b: Body,
    #[serde(rename = "type")]
    pub kind: AspectKind,
    pub exact_angle: f64,
    /// Deviation from the exact angle, rounded to 0.001°
    pub orb: f64,
    /// `None` when both bodies move at the same speed
    pub applying: Option<bool>,
}
