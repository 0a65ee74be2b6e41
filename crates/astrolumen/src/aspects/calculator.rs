use crate::aspects::types::{AspectBody, AspectRecord, OrbConfig};
use crate::search::normalize_signed;
use crate::western::signs::normalize_degrees;

/// Aspect calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct AspectCalculator;

impl AspectCalculator {
    /// Create a new aspect calculator
    pub fn new() -> Self {
        Self
    }

    /// Every aspect between every unordered pair of `bodies`.
    ///
    /// Pairs are visited in input order and kinds in [`crate::aspects::AspectKind::ALL`]
    /// order, so the output is deterministic for a given input.
    pub fn find_aspects(&self, bodies: &[AspectBody], orbs: &OrbConfig) -> Vec<AspectRecord> {
        let mut records = Vec::new();
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                records.extend(self.pair_aspects(a, b, orbs));
            }
        }
        records
    }

    /// Aspects formed by one pair. Usually zero or one; overlapping orbs
    /// can yield more.
    pub fn pair_aspects(&self, a: &AspectBody, b: &AspectBody, orbs: &OrbConfig) -> Vec<AspectRecord> {
        let separation = angular_separation(a.longitude, b.longitude);
        orbs.enabled()
            .filter_map(|(kind, limit)| {
                let deviation = separation - kind.exact_angle();
                let orb = deviation.abs();
                if orb > limit {
                    return None;
                }
                Some(AspectRecord {
                    body_a: a.body,
                    body_b: b.body,
                    kind,
                    exact_angle: kind.exact_angle(),
                    orb: round_to(orb, 3),
                    applying: is_applying(a, b, deviation),
                })
            })
            .collect()
    }

    /// Closest aspect (smallest orb) for a pair, if any
    pub fn closest_aspect(&self, a: &AspectBody, b: &AspectBody, orbs: &OrbConfig) -> Option<AspectRecord> {
        self.pair_aspects(a, b, orbs)
            .into_iter()
            .min_by(|x, y| x.orb.total_cmp(&y.orb))
    }
}

/// Shortest arc between two longitudes, in `[0, 180]`
pub fn angular_separation(lon1: f64, lon2: f64) -> f64 {
    let diff = normalize_degrees((lon1 - lon2).abs());
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Applying when the separation is moving toward the exact angle.
///
/// `deviation` is `separation - exact_angle`. The separation changes at
/// `relative_speed` times the sign of the signed arc from b to a, except at
/// 0° (where it can only grow) and 180° (where it can only shrink).
fn is_applying(a: &AspectBody, b: &AspectBody, deviation: f64) -> Option<bool> {
    let relative_speed = a.speed - b.speed;
    if relative_speed == 0.0 {
        return None;
    }
    let signed_arc = normalize_signed(a.longitude - b.longitude);
    let separation_rate = if signed_arc == 0.0 {
        relative_speed.abs()
    } else if signed_arc == 180.0 {
        -relative_speed.abs()
    } else {
        signed_arc.signum() * relative_speed
    };
    Some(deviation * separation_rate < 0.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
