//! Solar return, secondary progression and lunation.
//!
//! Each is an event search or a date offset followed by a chart (or a bare
//! event) through the natal pipeline.

use crate::chart::assembler::ChartAssembler;
use crate::chart::request::{LunationPhase, LunationRequest, ProgressionRequest, SolarReturnRequest};
use crate::chart::snapshot::{round6, ChartSnapshot};
use crate::ephemeris::Body;
use crate::error::ChartError;
use crate::search::{find_event_time, shift, EventSearchWindow};
use crate::western::normalize_degrees;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Mean tropical year in days
pub const TROPICAL_YEAR_DAYS: f64 = 365.2422;
pub const SOLAR_RETURN_HALF_WINDOW_DAYS: i64 = 3;
pub const LUNATION_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarReturnChart {
    pub natal_sun_longitude: f64,
    pub return_utc: DateTime<Utc>,
    /// Sun longitude minus natal longitude at `return_utc`
    pub residual_deg: f64,
    /// True when the window held no crossing and the closest sample was used
    pub approximate: bool,
    pub chart: ChartSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressedChart {
    pub elapsed_days: i64,
    pub offset_days: f64,
    pub progressed_local: NaiveDateTime,
    pub chart: ChartSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LunationEvent {
    pub phase: LunationPhase,
    pub utc: DateTime<Utc>,
    pub sun_longitude: f64,
    pub moon_longitude: f64,
    pub residual_deg: f64,
    pub approximate: bool,
}

/// Whole days from `birth` to `target` and the matching progressed offset
/// in days (one day per tropical year).
pub fn progression_offset(birth: NaiveDate, target: NaiveDate) -> (i64, f64) {
    let elapsed = (target - birth).num_days();
    (elapsed, elapsed as f64 / TROPICAL_YEAR_DAYS)
}

/// Same month and day in `year`; Feb 29 falls back to Feb 28.
pub fn anniversary(birth: NaiveDate, year: i32) -> Result<NaiveDate, ChartError> {
    NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
        .or_else(|| {
            (birth.month() == 2 && birth.day() == 29)
                .then(|| NaiveDate::from_ymd_opt(year, 2, 28))
                .flatten()
        })
        .ok_or_else(|| ChartError::InvalidDate {
            message: format!("no anniversary of {} in year {}", birth, year),
        })
}

fn fractional_days(days: f64) -> Duration {
    Duration::milliseconds((days * 86_400_000.0).round() as i64)
}

impl ChartAssembler {
    /// Chart for the instant the Sun returns to its natal longitude in
    /// `request.year`, searched within three days of the birthday.
    pub fn solar_return(&self, request: &SolarReturnRequest) -> Result<SolarReturnChart, ChartError> {
        let (frame, site, natal) = self.cast(&request.chart)?;
        let natal_sun = natal
            .planet(Body::Sun)
            .map(|sun| sun.longitude)
            .ok_or_else(|| ChartError::invariant("natal Sun missing from chart"))?;

        let day = anniversary(request.chart.birth_date, request.year)?;
        let center = self
            .timezones()
            .local_to_utc(day.and_time(request.chart.birth_time), &site.timezone)?;
        let window = EventSearchWindow::around(
            center,
            Duration::days(SOLAR_RETURN_HALF_WINDOW_DAYS),
            self.search_settings(),
        )?;

        let event = find_event_time(
            &window,
            |t| self.body_longitude(t, Body::Sun, frame.zodiac),
            natal_sun,
        )?;
        if !event.bracketed {
            log::warn!(
                "Solar return for {} is approximate: Sun misses {:.4} by {:.4}°",
                request.year,
                natal_sun,
                event.residual_deg
            );
        }

        let local = self.timezones().utc_to_local(event.at, &site.timezone)?;
        let chart = self.chart_at(&request.chart, frame, &site, local, event.at)?;
        Ok(SolarReturnChart {
            natal_sun_longitude: natal_sun,
            return_utc: event.at,
            residual_deg: event.residual_deg,
            approximate: !event.bracketed,
            chart,
        })
    }

    /// Secondary progression: the chart for birth + one day per year elapsed.
    pub fn progression(&self, request: &ProgressionRequest) -> Result<ProgressedChart, ChartError> {
        let (frame, site) = self.prepare(&request.chart)?;
        let (elapsed_days, offset_days) =
            progression_offset(request.chart.birth_date, request.target_date);
        let progressed_local = request
            .chart
            .local_datetime()
            .checked_add_signed(fractional_days(offset_days))
            .ok_or_else(|| ChartError::InvalidDate {
                message: format!(
                    "progression of {:.4} days from {} is out of range",
                    offset_days,
                    request.chart.local_datetime()
                ),
            })?;
        let utc = self.timezones().local_to_utc(progressed_local, &site.timezone)?;
        log::debug!(
            "Progressed {} days -> offset {:.4} days, local {}",
            elapsed_days,
            offset_days,
            progressed_local
        );

        let chart = self.chart_at(&request.chart, frame, &site, progressed_local, utc)?;
        Ok(ProgressedChart {
            elapsed_days,
            offset_days,
            progressed_local,
            chart,
        })
    }

    /// First new or full moon within 30 days of the reference date.
    pub fn lunation(&self, request: &LunationRequest) -> Result<LunationEvent, ChartError> {
        let zodiac = request.resolve_zodiac()?;
        let midnight = request
            .reference_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ChartError::InvalidDate {
                message: format!("no midnight on {}", request.reference_date),
            })?;
        let start = Utc.from_utc_datetime(&midnight);
        let end = shift(start, Duration::days(LUNATION_WINDOW_DAYS))?;
        let window = self.search_settings().window(start, end);

        let elongation = |t: DateTime<Utc>| -> Result<f64, ChartError> {
            let moon = self.body_longitude(t, Body::Moon, zodiac)?;
            let sun = self.body_longitude(t, Body::Sun, zodiac)?;
            Ok(normalize_degrees(moon - sun))
        };
        let event = find_event_time(&window, elongation, request.phase.target_angle())?;
        if !event.bracketed {
            log::warn!(
                "No {:?} moon bracketed after {}; using closest sample {}",
                request.phase,
                request.reference_date,
                event.at
            );
        }

        Ok(LunationEvent {
            phase: request.phase,
            utc: event.at,
            sun_longitude: round6(self.body_longitude(event.at, Body::Sun, zodiac)?),
            moon_longitude: round6(self.body_longitude(event.at, Body::Moon, zodiac)?),
            residual_deg: event.residual_deg,
            approximate: !event.bracketed,
        })
    }
}
