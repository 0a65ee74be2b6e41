//! Zodiac signs and the longitude -> sign/degree/minute mapping.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Cardinal,
    Fixed,
    Mutable,
}

/// Output language for human readable labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en")]
    En,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Sign at position `index` (0 = Aries), wrapping modulo 12.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Sign containing an ecliptic longitude, with no minute rounding.
    pub fn from_longitude(longitude: f64) -> Self {
        Self::from_index((normalize_degrees(longitude) / 30.0) as usize)
    }

    pub fn element(self) -> Element {
        match self.index() % 4 {
            0 => Element::Fire,
            1 => Element::Earth,
            2 => Element::Air,
            _ => Element::Water,
        }
    }

    pub fn modality(self) -> Modality {
        match self.index() % 3 {
            0 => Modality::Cardinal,
            1 => Modality::Fixed,
            _ => Modality::Mutable,
        }
    }

    pub fn label(self, language: Language) -> &'static str {
        const EN: [&str; 12] = [
            "Aries", "Taurus", "Gemini", "Cancer", "Leo", "Virgo",
            "Libra", "Scorpio", "Sagittarius", "Capricorn", "Aquarius", "Pisces",
        ];
        const PT_BR: [&str; 12] = [
            "Áries", "Touro", "Gêmeos", "Câncer", "Leão", "Virgem",
            "Libra", "Escorpião", "Sagitário", "Capricórnio", "Aquário", "Peixes",
        ];
        match language {
            Language::En => EN[self.index()],
            Language::PtBr => PT_BR[self.index()],
        }
    }
}

impl Element {
    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (Element::Fire, Language::En) => "Fire",
            (Element::Earth, Language::En) => "Earth",
            (Element::Air, Language::En) => "Air",
            (Element::Water, Language::En) => "Water",
            (Element::Fire, Language::PtBr) => "Fogo",
            (Element::Earth, Language::PtBr) => "Terra",
            (Element::Air, Language::PtBr) => "Ar",
            (Element::Water, Language::PtBr) => "Água",
        }
    }
}

impl Modality {
    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (Modality::Cardinal, _) => "Cardinal",
            (Modality::Fixed, Language::En) => "Fixed",
            (Modality::Mutable, Language::En) => "Mutable",
            (Modality::Fixed, Language::PtBr) => "Fixo",
            (Modality::Mutable, Language::PtBr) => "Mutável",
        }
    }
}

/// Position of a point within its sign, rounded to whole arc minutes.
///
/// `degree` is always in `0..30` and `minute` in `0..60`: a minute that
/// rounds up to 60 carries into the degree, and a degree that reaches 30
/// carries into the next sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignPosition {
    pub sign: ZodiacSign,
    pub degree: u8,
    pub minute: u8,
}

impl SignPosition {
    /// Longitude (degrees, 0-360) represented by this position.
    pub fn to_longitude(self) -> f64 {
        self.sign.index() as f64 * 30.0 + self.degree as f64 + self.minute as f64 / 60.0
    }
}

/// Wrap any angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Map an ecliptic longitude to sign, degree and minute.
pub fn to_sign_position(longitude: f64) -> SignPosition {
    let normalized = normalize_degrees(longitude);
    let mut sign_index = (normalized / 30.0).floor() as usize;
    let degree_in_sign = normalized % 30.0;
    let mut degree = degree_in_sign.floor() as u32;
    let mut minute = ((degree_in_sign - degree as f64) * 60.0).round() as u32;

    if minute == 60 {
        degree += 1;
        minute = 0;
    }
    if degree == 30 {
        degree = 0;
        sign_index = (sign_index + 1) % 12;
    }

    SignPosition {
        sign: ZodiacSign::from_index(sign_index),
        degree: degree as u8,
        minute: minute as u8,
    }
}

/// Localized `(sign, element, modality)` labels.
pub fn describe_sign(sign: ZodiacSign, language: Language) -> (&'static str, &'static str, &'static str) {
    (
        sign.label(language),
        sign.element().label(language),
        sign.modality().label(language),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_mapping() {
        let pos = to_sign_position(45.5);
        assert_eq!(pos.sign, ZodiacSign::Taurus);
        assert_eq!(pos.degree, 15);
        assert_eq!(pos.minute, 30);
    }

    #[test]
    fn test_minute_carry_into_degree() {
        // 10° 59.9' rounds to 11° 00'
        let pos = to_sign_position(10.0 + 59.9 / 60.0);
        assert_eq!(pos.sign, ZodiacSign::Aries);
        assert_eq!(pos.degree, 11);
        assert_eq!(pos.minute, 0);
    }

    #[test]
    fn test_double_carry_into_next_sign() {
        let pos = to_sign_position(59.9999);
        assert_eq!(pos.sign, ZodiacSign::Gemini);
        assert_eq!(pos.degree, 0);
        assert_eq!(pos.minute, 0);
    }

    #[test]
    fn test_pisces_wraps_to_aries() {
        let pos = to_sign_position(359.9999);
        assert_eq!(pos.sign, ZodiacSign::Aries);
        assert_eq!(pos.degree, 0);
        assert_eq!(pos.minute, 0);
    }

    #[test]
    fn test_negative_longitude() {
        let pos = to_sign_position(-30.0);
        assert_eq!(pos.sign, ZodiacSign::Pisces);
        assert_eq!(pos.degree, 0);
    }

    #[test]
    fn test_element_and_modality() {
        assert_eq!(ZodiacSign::Leo.element(), Element::Fire);
        assert_eq!(ZodiacSign::Scorpio.element(), Element::Water);
        assert_eq!(ZodiacSign::Capricorn.modality(), Modality::Cardinal);
        assert_eq!(ZodiacSign::Aquarius.modality(), Modality::Fixed);
        assert_eq!(ZodiacSign::Pisces.modality(), Modality::Mutable);
    }

    #[test]
    fn test_describe_sign_pt_br() {
        let (label, element, modality) = describe_sign(ZodiacSign::Gemini, Language::PtBr);
        assert_eq!(label, "Gêmeos");
        assert_eq!(element, "Ar");
        assert_eq!(modality, "Mutável");
    }
}
