//! One-line highlights of a chart in the request language.

use crate::chart::snapshot::{ChartPoints, PlanetPosition};
use crate::ephemeris::Body;
use crate::western::{describe_sign, Language, ZodiacSign};

struct Labels {
    sun: &'static str,
    moon: &'static str,
    ascendant: &'static str,
    venus: &'static str,
    mars: &'static str,
    midheaven: &'static str,
    preposition: &'static str,
}

fn labels(language: Language) -> Labels {
    match language {
        Language::PtBr => Labels {
            sun: "Sol",
            moon: "Lua",
            ascendant: "Ascendente",
            venus: "Vênus",
            mars: "Marte",
            midheaven: "MC",
            preposition: "em",
        },
        Language::En => Labels {
            sun: "Sun",
            moon: "Moon",
            ascendant: "Ascendant",
            venus: "Venus",
            mars: "Mars",
            midheaven: "MC",
            preposition: "in",
        },
    }
}

fn detailed(label: &str, sign: ZodiacSign, labels: &Labels, language: Language) -> String {
    let (name, element, modality) = describe_sign(sign, language);
    format!("{} {} {} ({}, {})", label, labels.preposition, name, element, modality)
}

fn brief(label: &str, sign: ZodiacSign, labels: &Labels, language: Language) -> String {
    format!("{} {} {}", label, labels.preposition, sign.label(language))
}

/// Sun, Moon, Ascendant, Venus, Mars and MC, skipping absent bodies.
pub fn build_summary(planets: &[PlanetPosition], points: &ChartPoints, language: Language) -> Vec<String> {
    let l = labels(language);
    let sign_of = |body: Body| {
        planets
            .iter()
            .find(|p| p.name == body)
            .map(|p| p.position.sign)
    };

    let mut summary = Vec::with_capacity(6);
    if let Some(sign) = sign_of(Body::Sun) {
        summary.push(detailed(l.sun, sign, &l, language));
    }
    if let Some(sign) = sign_of(Body::Moon) {
        summary.push(detailed(l.moon, sign, &l, language));
    }
    summary.push(detailed(l.ascendant, points.asc.position.sign, &l, language));
    if let Some(sign) = sign_of(Body::Venus) {
        summary.push(brief(l.venus, sign, &l, language));
    }
    if let Some(sign) = sign_of(Body::Mars) {
        summary.push(brief(l.mars, sign, &l, language));
    }
    summary.push(brief(l.midheaven, points.mc.position.sign, &l, language));
    summary
}
