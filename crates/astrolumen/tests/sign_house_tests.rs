use astrolumen::aspects::angular_separation;
use astrolumen::houses::{locate_house, normalize_cusps, resolve_house};
use astrolumen::western::{to_sign_position, ZodiacSign};

#[test]
fn test_sign_position_reconstructs_longitude() {
    let mut longitude = 0.0;
    while longitude < 360.0 {
        let position = to_sign_position(longitude);
        assert!(position.degree < 30, "degree escaped at {}", longitude);
        assert!(position.minute < 60, "minute escaped at {}", longitude);
        let error = angular_separation(position.to_longitude(), longitude);
        assert!(error <= 1.0 / 60.0 + 1e-9, "{} reconstructed with error {}", longitude, error);
        longitude += 0.013_7;
    }
}

#[test]
fn test_minute_carry_into_degree() {
    // 12°59.7' rounds to 13°00'
    let position = to_sign_position(12.0 + 59.7 / 60.0);
    assert_eq!(position.sign, ZodiacSign::Aries);
    assert_eq!((position.degree, position.minute), (13, 0));
}

#[test]
fn test_degree_carry_into_next_sign() {
    // 29°59.8' Gemini rounds to 0°00' Cancer
    let position = to_sign_position(60.0 + 29.0 + 59.8 / 60.0);
    assert_eq!(position.sign, ZodiacSign::Cancer);
    assert_eq!((position.degree, position.minute), (0, 0));
}

#[test]
fn test_pisces_rolls_over_to_aries() {
    let position = to_sign_position(359.999_9);
    assert_eq!(position.sign, ZodiacSign::Aries);
    assert_eq!((position.degree, position.minute), (0, 0));
    assert_eq!(to_sign_position(360.0).sign, ZodiacSign::Aries);
    assert_eq!(to_sign_position(-15.0).sign, ZodiacSign::Pisces);
}

fn equal_cusps(start: f64) -> [f64; 12] {
    let raw: Vec<f64> = (0..12).map(|i| (start + 30.0 * i as f64) % 360.0).collect();
    normalize_cusps(&raw)
}

#[test]
fn test_equal_houses_from_zero() {
    let cusps = equal_cusps(0.0);
    assert_eq!(resolve_house(15.0, &cusps), 1);
    assert_eq!(resolve_house(45.0, &cusps), 2);
    assert_eq!(resolve_house(359.0, &cusps), 12);
    assert_eq!(resolve_house(30.0, &cusps), 2);
}

#[test]
fn test_house_wrapping_through_aries() {
    let cusps = equal_cusps(345.0);
    assert_eq!(resolve_house(350.0, &cusps), 1);
    assert_eq!(resolve_house(5.0, &cusps), 1);
    assert_eq!(resolve_house(15.0, &cusps), 2);
    assert_eq!(resolve_house(344.0, &cusps), 12);
}

#[test]
fn test_cusp_sequence_normalization() {
    let mut with_sentinel = vec![0.0];
    with_sentinel.extend((0..12).map(|i| 10.0 + 30.0 * i as f64));
    let cusps = normalize_cusps(&with_sentinel);
    assert_eq!(cusps[0], 10.0);
    assert_eq!(cusps[11], 340.0);

    let long: Vec<f64> = (0..14).map(|i| i as f64).collect();
    assert_eq!(normalize_cusps(&long)[11], 11.0);

    let short = normalize_cusps(&[0.0, 90.0, 180.0]);
    assert_eq!(short[2..], [180.0; 10]);
}

#[test]
fn test_degenerate_cusps_fall_back_to_first_house() {
    let cusps = normalize_cusps(&[42.0]);
    assert_eq!(locate_house(100.0, &cusps), None);
    assert_eq!(resolve_house(100.0, &cusps), 1);
}
