//! Deterministic mean-motion ephemeris.
//!
//! Every body advances linearly from its J2000 mean longitude. The values are
//! smooth and repeatable but only roughly astronomical; this backend exists
//! for mock mode and tests where Swiss Ephemeris data files are absent.

use crate::ephemeris::types::{
    Ayanamsa, Body, EclipticPosition, GeoLocation, HouseFrame, HouseSystem, HouseSystemProvider,
    PositionProvider, ZodiacMode,
};
use crate::error::ChartError;
use crate::western::signs::normalize_degrees;
use chrono::{DateTime, Utc};

const J2000: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const OBLIQUITY_DEG: f64 = 23.4393;
/// General precession in longitude, degrees per day (50.29"/yr)
const PRECESSION_PER_DAY: f64 = 50.29 / 3600.0 / 365.25;

/// (body, mean longitude at J2000, mean daily motion)
const MEAN_ELEMENTS: &[(Body, f64, f64)] = &[
    (Body::Sun, 280.46646, 0.985_647_36),
    (Body::Moon, 218.3165, 13.176_396_48),
    (Body::Mercury, 252.2509, 4.092_334_45),
    (Body::Venus, 181.9798, 1.602_130_34),
    (Body::Mars, 355.4330, 0.524_020_68),
    (Body::Jupiter, 34.3515, 0.083_085_29),
    (Body::Saturn, 50.0774, 0.033_444_14),
    (Body::Uranus, 314.0550, 0.011_728_34),
    (Body::Neptune, 304.3487, 0.005_981_03),
    (Body::Pluto, 238.9290, 0.003_976_71),
    (Body::TrueNode, 125.0445, -0.052_953_77),
    (Body::Chiron, 251.0, 0.019_440_00),
];

/// Julian Day (UT) of a UTC instant
pub fn julian_day(dt: DateTime<Utc>) -> f64 {
    let seconds = dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9;
    UNIX_EPOCH_JD + seconds / 86_400.0
}

/// Approximate ayanamsa value in degrees at `jd`.
fn ayanamsa_offset(ayanamsa: Ayanamsa, jd: f64) -> f64 {
    let at_j2000 = match ayanamsa {
        Ayanamsa::Lahiri => 23.853,
        Ayanamsa::FaganBradley => 24.740,
        Ayanamsa::Krishnamurti => 23.757,
        Ayanamsa::Raman => 22.411,
        Ayanamsa::DeLuce => 27.816,
        Ayanamsa::Yukteshwar => 22.478,
        Ayanamsa::DjwhalKhul => 28.359,
        Ayanamsa::TrueCitra => 23.841,
        Ayanamsa::TrueRevati => 20.045,
        Ayanamsa::Aryabhata => 22.970,
    };
    at_j2000 + (jd - J2000) * PRECESSION_PER_DAY
}

fn apply_zodiac(longitude: f64, zodiac: ZodiacMode, jd: f64) -> f64 {
    match zodiac {
        ZodiacMode::Tropical => normalize_degrees(longitude),
        ZodiacMode::Sidereal(ayanamsa) => normalize_degrees(longitude - ayanamsa_offset(ayanamsa, jd)),
    }
}

/// Mean-motion ephemeris serving both positions and houses
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanMotionEphemeris;

impl MeanMotionEphemeris {
    pub fn new() -> Self {
        Self
    }

    fn angles(&self, jd: f64, location: GeoLocation) -> (f64, f64) {
        let d = jd - J2000;
        let ramc = normalize_degrees(280.460_618_37 + 360.985_647_366_29 * d + location.lon).to_radians();
        let eps = OBLIQUITY_DEG.to_radians();
        let phi = location.lat.clamp(-89.9, 89.9).to_radians();

        let mc = ramc.sin().atan2(ramc.cos() * eps.cos()).to_degrees();
        let asc = ramc
            .cos()
            .atan2(-(ramc.sin() * eps.cos() + phi.tan() * eps.sin()))
            .to_degrees();
        (normalize_degrees(asc), normalize_degrees(mc))
    }
}

impl PositionProvider for MeanMotionEphemeris {
    fn position(
        &self,
        at: DateTime<Utc>,
        body: Body,
        zodiac: ZodiacMode,
    ) -> Result<EclipticPosition, ChartError> {
        let (_, l0, n) = MEAN_ELEMENTS
            .iter()
            .find(|(b, _, _)| *b == body)
            .copied()
            .ok_or_else(|| ChartError::CalculationFailed {
                body: body.to_string(),
                datetime: at,
                message: "body not supported by the mean-motion ephemeris".to_string(),
            })?;
        let jd = julian_day(at);
        Ok(EclipticPosition {
            longitude: apply_zodiac(l0 + n * (jd - J2000), zodiac, jd),
            latitude: 0.0,
            speed: n,
        })
    }

    fn source_flag(&self) -> String {
        "MOCK_MODE".to_string()
    }
}

impl HouseSystemProvider for MeanMotionEphemeris {
    /// Equal houses from the ascendant (whole-sign houses for `W`), returned
    /// with a leading sentinel entry the way Swiss Ephemeris does.
    fn houses(
        &self,
        at: DateTime<Utc>,
        location: GeoLocation,
        system: HouseSystem,
        zodiac: ZodiacMode,
    ) -> Result<HouseFrame, ChartError> {
        let jd = julian_day(at);
        let (asc, mc) = self.angles(jd, location);
        let asc = apply_zodiac(asc, zodiac, jd);
        let mc = apply_zodiac(mc, zodiac, jd);

        let first = match system {
            HouseSystem::WholeSign => (asc / 30.0).floor() * 30.0,
            _ => asc,
        };
        let mut cusps = Vec::with_capacity(13);
        cusps.push(0.0);
        cusps.extend((0..12).map(|i| normalize_degrees(first + 30.0 * i as f64)));

        Ok(HouseFrame {
            cusps,
            ascendant: asc,
            midheaven: mc,
            vertex: None,
        })
    }
}
