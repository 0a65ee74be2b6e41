//! Angular event search.
//!
//! Finds when a periodic angular metric (a body's longitude, the Moon-Sun
//! elongation, ...) reaches a target angle: coarse scan at a fixed step,
//! then bisection inside the first bracket that shows a genuine sign change
//! of the signed difference.
//!
//! When the window holds no crossing the closest coarse sample is returned
//! and [`EventTime::bracketed`] is false. Callers decide whether that is
//! good enough.

use crate::error::ChartError;
use chrono::{DateTime, Duration, Utc};

/// Default coarse-scan step
pub const DEFAULT_STEP_HOURS: i64 = 6;
/// Default convergence tolerance in degrees
pub const DEFAULT_TOLERANCE_DEG: f64 = 1e-4;
/// Default bisection iteration budget
pub const DEFAULT_MAX_ITERATIONS: u32 = 24;

/// Scan step, tolerance and iteration budget shared by every search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub step: Duration,
    pub tolerance_deg: f64,
    pub max_iterations: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            step: Duration::hours(DEFAULT_STEP_HOURS),
            tolerance_deg: DEFAULT_TOLERANCE_DEG,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SearchSettings {
    /// Window over `[start, end]` with these settings
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> EventSearchWindow {
        EventSearchWindow {
            start,
            end,
            step: self.step,
            tolerance_deg: self.tolerance_deg,
            max_iterations: self.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventSearchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: Duration,
    pub tolerance_deg: f64,
    pub max_iterations: u32,
}

impl EventSearchWindow {
    /// Window of `half_width` on both sides of `center`.
    ///
    /// Fails with [`ChartError::InvalidDate`] when either edge falls outside
    /// the representable date range.
    pub fn around(
        center: DateTime<Utc>,
        half_width: Duration,
        settings: &SearchSettings,
    ) -> Result<Self, ChartError> {
        let start = center
            .checked_sub_signed(half_width)
            .ok_or_else(|| out_of_range(center, -half_width))?;
        let end = shift(center, half_width)?;
        Ok(settings.window(start, end))
    }
}

/// `at + by`, or [`ChartError::InvalidDate`] past the end of the calendar
pub fn shift(at: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>, ChartError> {
    at.checked_add_signed(by).ok_or_else(|| out_of_range(at, by))
}

fn out_of_range(at: DateTime<Utc>, by: Duration) -> ChartError {
    ChartError::InvalidDate {
        message: format!("{} shifted by {}s is out of range", at.to_rfc3339(), by.num_seconds()),
    }
}

/// Outcome of an event search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTime {
    pub at: DateTime<Utc>,
    /// Signed difference `metric(at) - target` in (-180, 180]
    pub residual_deg: f64,
    /// False when no crossing was found and `at` is the closest sample
    pub bracketed: bool,
}

/// Wrap an angle into (-180, 180].
pub fn normalize_signed(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// A sign change is a real crossing only when both sides are small; a jump
/// between roughly +180 and -180 is the wrap of the signed difference.
fn is_genuine_crossing(f_a: f64, f_b: f64) -> bool {
    f_a * f_b < 0.0 && (f_a - f_b).abs() < 270.0
}

/// Find when `metric(t)` reaches `target_deg` inside `window`.
///
/// Metric errors abort the search and propagate. An empty or inverted
/// window, or a non-positive step, evaluates only `window.start`.
pub fn find_event_time<F>(
    window: &EventSearchWindow,
    mut metric: F,
    target_deg: f64,
) -> Result<EventTime, ChartError>
where
    F: FnMut(DateTime<Utc>) -> Result<f64, ChartError>,
{
    let mut diff_at = |t: DateTime<Utc>| -> Result<f64, ChartError> {
        Ok(normalize_signed(metric(t)? - target_deg))
    };

    let mut t_prev = window.start;
    let mut f_prev = diff_at(t_prev)?;
    let mut best = EventTime {
        at: t_prev,
        residual_deg: f_prev,
        bracketed: false,
    };
    if f_prev == 0.0 {
        return Ok(EventTime {
            bracketed: true,
            ..best
        });
    }
    if window.step <= Duration::zero() {
        return Ok(best);
    }

    while t_prev < window.end {
        let t_curr = t_prev
            .checked_add_signed(window.step)
            .map_or(window.end, |t| t.min(window.end));
        let f_curr = diff_at(t_curr)?;

        if f_curr.abs() < best.residual_deg.abs() {
            best = EventTime {
                at: t_curr,
                residual_deg: f_curr,
                bracketed: false,
            };
        }

        if f_curr == 0.0 {
            return Ok(EventTime {
                at: t_curr,
                residual_deg: 0.0,
                bracketed: true,
            });
        }

        if is_genuine_crossing(f_prev, f_curr) {
            log::debug!(
                "Bracketed target {:.4} between {} and {}",
                target_deg,
                t_prev,
                t_curr
            );
            return bisect(window, &mut diff_at, t_prev, f_prev, t_curr);
        }

        t_prev = t_curr;
        f_prev = f_curr;
    }

    log::warn!(
        "No crossing of {:.4} in [{}, {}]; using closest sample {} (residual {:.4})",
        target_deg,
        window.start,
        window.end,
        best.at,
        best.residual_deg
    );
    Ok(best)
}

fn bisect<G>(
    window: &EventSearchWindow,
    diff_at: &mut G,
    mut t_lo: DateTime<Utc>,
    mut f_lo: f64,
    mut t_hi: DateTime<Utc>,
) -> Result<EventTime, ChartError>
where
    G: FnMut(DateTime<Utc>) -> Result<f64, ChartError>,
{
    let mut t_mid = midpoint(t_lo, t_hi);
    let mut f_mid = diff_at(t_mid)?;

    for _ in 0..window.max_iterations {
        if f_mid.abs() < window.tolerance_deg {
            break;
        }
        if f_lo * f_mid <= 0.0 {
            t_hi = t_mid;
        } else {
            t_lo = t_mid;
            f_lo = f_mid;
        }
        t_mid = midpoint(t_lo, t_hi);
        f_mid = diff_at(t_mid)?;
    }

    Ok(EventTime {
        at: t_mid,
        residual_deg: f_mid,
        bracketed: true,
    })
}

fn midpoint(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    a + (b - a) / 2
}
