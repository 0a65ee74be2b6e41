use crate::ephemeris::types::{
    Ayanamsa, Body, EclipticPosition, GeoLocation, HouseFrame, HouseSystem, HouseSystemProvider,
    PositionProvider, ZodiacMode,
};
use crate::error::ChartError;
use crate::western::signs::normalize_degrees;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use swisseph::swe::{calc_ut, houses_ex, julday};
use swisseph::{AscMc, Cusp};

// Swiss Ephemeris body numbers
fn body_code(body: Body) -> u32 {
    match body {
        Body::Sun => 0,
        Body::Moon => 1,
        Body::Mercury => 2,
        Body::Venus => 3,
        Body::Mars => 4,
        Body::Jupiter => 5,
        Body::Saturn => 6,
        Body::Uranus => 7,
        Body::Neptune => 8,
        Body::Pluto => 9,
        Body::TrueNode => 11,
        Body::Chiron => 15,
    }
}

// SIDM_* constants
fn sidereal_mode_code(ayanamsa: Ayanamsa) -> i32 {
    match ayanamsa {
        Ayanamsa::FaganBradley => 0,
        Ayanamsa::Lahiri => 1,
        Ayanamsa::DeLuce => 2,
        Ayanamsa::Raman => 3,
        Ayanamsa::Krishnamurti => 5,
        Ayanamsa::DjwhalKhul => 6,
        Ayanamsa::Yukteshwar => 7,
        Ayanamsa::TrueCitra => 27,
        Ayanamsa::TrueRevati => 28,
        Ayanamsa::Aryabhata => 23,
    }
}

lazy_static::lazy_static! {
    // The library keeps the ephemeris path and sidereal mode in process globals
    static ref SWE_LOCK: Mutex<()> = Mutex::new(());
}

/// Held across every call that reads or writes library globals.
fn swe_guard() -> MutexGuard<'static, ()> {
    SWE_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

const FLG_SWIEPH: i32 = 2;
const FLG_SPEED: i32 = 256;
const FLG_SIDEREAL: i32 = 64 * 1024;

/// Swiss Ephemeris backed position and house provider
pub struct SwissEphemeris {
    ephemeris_path: Option<PathBuf>,
}

impl SwissEphemeris {
    /// Create a provider. The data path comes from the argument, then
    /// `SWISS_EPHEMERIS_PATH`, then `/usr/local/share/swisseph`.
    pub fn new(ephemeris_path: Option<PathBuf>) -> Result<Self, ChartError> {
        let explicit = ephemeris_path.or_else(|| env::var("SWISS_EPHEMERIS_PATH").ok().map(PathBuf::from));
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from("/usr/local/share/swisseph"));

        if !path.exists() {
            return Err(ChartError::FileNotFound {
                path: path.display().to_string(),
                message: "Ephemeris path does not exist. Please ensure Swiss Ephemeris data files are installed.".to_string(),
            });
        }
        {
            let _guard = swe_guard();
            swisseph::swe::set_ephe_path(&path.to_string_lossy());
        }
        log::info!("Swiss Ephemeris data path: {}", path.display());

        Ok(Self {
            ephemeris_path: explicit,
        })
    }

    /// Calculation flags for `zodiac`; sets the sidereal mode as a side
    /// effect, so callers must hold [`swe_guard`].
    fn flags(&self, zodiac: ZodiacMode) -> i32 {
        match zodiac {
            ZodiacMode::Tropical => FLG_SWIEPH | FLG_SPEED,
            ZodiacMode::Sidereal(ayanamsa) => {
                swisseph::swe::set_sid_mode(sidereal_mode_code(ayanamsa), 0.0, 0.0);
                FLG_SWIEPH | FLG_SPEED | FLG_SIDEREAL
            }
        }
    }
}

impl PositionProvider for SwissEphemeris {
    fn position(
        &self,
        at: DateTime<Utc>,
        body: Body,
        zodiac: ZodiacMode,
    ) -> Result<EclipticPosition, ChartError> {
        let jd = datetime_to_julian_day(at);
        let result = {
            let _guard = swe_guard();
            let flags = self.flags(zodiac);
            calc_ut(jd, body_code(body), flags as u32)
        }
        .map_err(|e| ChartError::CalculationFailed {
            body: body.to_string(),
            datetime: at,
            message: format!("Swiss Ephemeris error: {}", e),
        })?;

        let out = result.out;
        Ok(EclipticPosition {
            longitude: normalize_degrees(out[0]),
            latitude: out[1],
            speed: out[3],
        })
    }

    fn source_flag(&self) -> String {
        match &self.ephemeris_path {
            Some(path) => format!("EPHE_PATH={}", path.display()),
            None => "DEFAULT_EPHE".to_string(),
        }
    }
}

impl HouseSystemProvider for SwissEphemeris {
    fn houses(
        &self,
        at: DateTime<Utc>,
        location: GeoLocation,
        system: HouseSystem,
        zodiac: ZodiacMode,
    ) -> Result<HouseFrame, ChartError> {
        let jd = datetime_to_julian_day(at);
        let (c, a) = {
            let _guard = swe_guard();
            let flags = self.flags(zodiac);
            houses_ex(jd, flags, location.lat, location.lon, system.code() as i32)
        };
        let cusps = Cusp::from_array(c);
        let ascmc = AscMc::from_array(a);

        let cusp_values = vec![
            cusps.first, cusps.second, cusps.third, cusps.fourth,
            cusps.fifth, cusps.sixth, cusps.seventh, cusps.eighth,
            cusps.ninth, cusps.tenth, cusps.eleventh, cusps.twelfth,
        ];
        if cusp_values.iter().any(|c| !c.is_finite()) {
            return Err(ChartError::HouseCalculationFailed {
                message: format!("non-finite cusp for system {} at {}", system.code(), at),
            });
        }

        Ok(HouseFrame {
            cusps: cusp_values,
            ascendant: normalize_degrees(ascmc.ascendant),
            midheaven: normalize_degrees(ascmc.mc),
            vertex: None,
        })
    }
}

/// Convert UTC datetime to Julian Day
fn datetime_to_julian_day(dt: DateTime<Utc>) -> f64 {
    let hour_decimal =
        dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;
    // GREG_CAL = 1
    julday(dt.year(), dt.month() as i32, dt.day() as i32, hour_decimal, 1)
}
