//! Essential dignities for Western astrology.
//!
//! Rulership, detriment, exaltation, fall and exact exaltation by sign.

use crate::ephemeris::Body;
use crate::western::signs::{normalize_degrees, ZodiacSign};
use serde::{Deserialize, Serialize};

use ZodiacSign::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DignityType {
    Rulership,
    Detriment,
    Exaltation,
    Fall,
    ExactExaltation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DignityResult {
    #[serde(rename = "type")]
    pub dignity_type: DignityType,
    pub sign: ZodiacSign,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExactExaltation {
    pub body: Body,
    /// Longitude in degrees
    pub position: f64,
    /// Orb in degrees
    pub orb: f64,
}

struct SignDignities {
    rulership: &'static [ZodiacSign],
    detriment: &'static [ZodiacSign],
    exaltation: Option<ZodiacSign>,
    fall: Option<ZodiacSign>,
}

fn table(body: Body) -> Option<SignDignities> {
    let entry = |rulership, detriment, exaltation, fall| SignDignities {
        rulership,
        detriment,
        exaltation,
        fall,
    };
    match body {
        Body::Sun => Some(entry(&[Leo], &[Aquarius], Some(Aries), Some(Libra))),
        Body::Moon => Some(entry(&[Cancer], &[Capricorn], Some(Taurus), Some(Scorpio))),
        Body::Mercury => Some(entry(&[Gemini, Virgo], &[Sagittarius, Pisces], Some(Virgo), Some(Pisces))),
        Body::Venus => Some(entry(&[Taurus, Libra], &[Aries, Scorpio], Some(Pisces), Some(Virgo))),
        Body::Mars => Some(entry(&[Aries, Scorpio], &[Libra, Taurus], Some(Capricorn), Some(Cancer))),
        Body::Jupiter => Some(entry(&[Sagittarius, Pisces], &[Gemini, Virgo], Some(Cancer), Some(Capricorn))),
        Body::Saturn => Some(entry(&[Capricorn, Aquarius], &[Cancer, Leo], Some(Libra), Some(Aries))),
        Body::Uranus => Some(entry(&[Aquarius], &[Leo], None, None)),
        Body::Neptune => Some(entry(&[Pisces], &[Virgo], None, None)),
        Body::Pluto => Some(entry(&[Scorpio], &[Taurus], Some(Aries), Some(Libra))),
        Body::TrueNode | Body::Chiron => None,
    }
}

/// Check if `position` is within `orb` of `exact`, across 0°.
fn within_orb(position: f64, exact: f64, orb: f64) -> bool {
    let diff = (position - exact).rem_euclid(360.0);
    diff.min(360.0 - diff) <= orb
}

#[derive(Debug, Clone)]
pub struct DignitiesService {
    exact_exaltations: Vec<ExactExaltation>,
}

impl Default for DignitiesService {
    fn default() -> Self {
        Self {
            exact_exaltations: Self::default_exact_exaltations(),
        }
    }
}

impl DignitiesService {
    pub fn new(exact_exaltations: Vec<ExactExaltation>) -> Self {
        Self { exact_exaltations }
    }

    /// Get dignities for a body based on its longitude
    pub fn get_dignities(&self, body: Body, longitude: f64) -> Vec<DignityResult> {
        let Some(entry) = table(body) else {
            return Vec::new();
        };
        let position = normalize_degrees(longitude);
        let sign = ZodiacSign::from_longitude(position);
        let plain = |dignity_type| DignityResult {
            dignity_type,
            sign,
            degree: None,
        };

        let mut result = Vec::new();
        if entry.rulership.contains(&sign) {
            result.push(plain(DignityType::Rulership));
        } else if entry.detriment.contains(&sign) {
            result.push(plain(DignityType::Detriment));
        }
        if entry.exaltation == Some(sign) {
            result.push(plain(DignityType::Exaltation));
        } else if entry.fall == Some(sign) {
            result.push(plain(DignityType::Fall));
        }

        for exact in self.exact_exaltations.iter().filter(|e| e.body == body) {
            if within_orb(position, exact.position, exact.orb) {
                result.push(DignityResult {
                    dignity_type: DignityType::ExactExaltation,
                    sign,
                    degree: Some(exact.position),
                });
            }
        }

        result
    }

    /// Default exact exaltation degrees, 2° orb
    pub fn default_exact_exaltations() -> Vec<ExactExaltation> {
        [
            (Body::Sun, 19.0),
            (Body::Moon, 33.0),
            (Body::Mercury, 165.0),
            (Body::Venus, 357.0),
            (Body::Mars, 298.0),
            (Body::Jupiter, 95.0),
            (Body::Saturn, 201.0),
        ]
        .into_iter()
        .map(|(body, position)| ExactExaltation {
            body,
            position,
            orb: 2.0,
        })
        .collect()
    }
}
