//! House cusp normalization and house membership.

use crate::western::signs::normalize_degrees;

/// Coerce a provider's cusp sequence to exactly twelve longitudes.
///
/// A 13-entry sequence carries a leading sentinel which is dropped; longer
/// sequences are truncated; shorter ones are padded by repeating the last
/// entry (or 0.0 when empty).
pub fn normalize_cusps(raw: &[f64]) -> [f64; 12] {
    let source = if raw.len() == 13 { &raw[1..] } else { raw };
    let fill = source.last().copied().unwrap_or(0.0);
    let mut cusps = [fill; 12];
    for (slot, value) in cusps.iter_mut().zip(source.iter()) {
        *slot = *value;
    }
    cusps
}

/// House (1-12) containing `longitude`, or `None` when the cusps are
/// degenerate and no house interval contains it.
pub fn locate_house(longitude: f64, cusps: &[f64; 12]) -> Option<u8> {
    let lon = normalize_degrees(longitude);
    (0..12).find_map(|i| {
        let start = normalize_degrees(cusps[i]);
        let end = normalize_degrees(cusps[(i + 1) % 12]);
        let inside = if start < end {
            start <= lon && lon < end
        } else if start > end {
            lon >= start || lon < end
        } else {
            false
        };
        inside.then_some(i as u8 + 1)
    })
}

/// House (1-12) containing `longitude`, falling back to house 1 for
/// degenerate cusps.
pub fn resolve_house(longitude: f64, cusps: &[f64; 12]) -> u8 {
    locate_house(longitude, cusps).unwrap_or_else(|| {
        log::warn!(
            "No house interval contains {:.4}; cusps are degenerate, defaulting to house 1",
            longitude
        );
        1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equal_cusps() -> [f64; 12] {
        let mut cusps = [0.0; 12];
        for (i, c) in cusps.iter_mut().enumerate() {
            *c = i as f64 * 30.0;
        }
        cusps
    }

    #[test]
    fn test_normalize_drops_sentinel() {
        let mut raw = vec![0.0];
        raw.extend((1..=12).map(|i| i as f64 * 10.0));
        let cusps = normalize_cusps(&raw);
        assert_eq!(cusps[0], 10.0);
        assert_eq!(cusps[11], 120.0);
    }

    #[test]
    fn test_normalize_truncates() {
        let raw: Vec<f64> = (0..15).map(|i| i as f64).collect();
        let cusps = normalize_cusps(&raw);
        assert_eq!(cusps[0], 0.0);
        assert_eq!(cusps[11], 11.0);
    }

    #[test]
    fn test_normalize_pads_with_last() {
        let cusps = normalize_cusps(&[10.0, 40.0, 70.0]);
        assert_eq!(cusps[2], 70.0);
        assert_eq!(cusps[3], 70.0);
        assert_eq!(cusps[11], 70.0);
        assert_eq!(normalize_cusps(&[]), [0.0; 12]);
    }

    #[test]
    fn test_equal_houses() {
        let cusps = equal_cusps();
        assert_eq!(resolve_house(15.0, &cusps), 1);
        assert_eq!(resolve_house(45.0, &cusps), 2);
        assert_eq!(resolve_house(359.0, &cusps), 12);
        assert_eq!(resolve_house(30.0, &cusps), 2);
    }

    #[test]
    fn test_wraparound_house() {
        // First house spans Pisces into Aries
        let mut cusps = [0.0; 12];
        for (i, c) in cusps.iter_mut().enumerate() {
            *c = normalize_degrees(350.0 + i as f64 * 30.0);
        }
        assert_eq!(resolve_house(355.0, &cusps), 1);
        assert_eq!(resolve_house(5.0, &cusps), 1);
        assert_eq!(resolve_house(20.0, &cusps), 2);
    }

    #[test]
    fn test_degenerate_cusps_fall_back_to_first_house() {
        let cusps = [100.0; 12];
        assert_eq!(locate_house(200.0, &cusps), None);
        assert_eq!(resolve_house(200.0, &cusps), 1);
    }
}
