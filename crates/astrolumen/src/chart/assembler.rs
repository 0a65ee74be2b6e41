//! Natal chart assembly.
//!
//! Resolves place, timezone and zodiac frame, then pulls houses and body
//! positions from the providers and derives signs, houses, aspects, points
//! and the summary. Derived techniques in [`crate::chart::techniques`] reuse
//! [`ChartAssembler::chart_at`] with a different instant.

use crate::aspects::{AspectBody, AspectCalculator};
use crate::chart::request::ChartRequest;
use crate::chart::snapshot::{
    round6, AnglePoint, ChartMetadata, ChartPoints, ChartSnapshot, HouseCusp, PlanetPosition,
};
use crate::chart::summary::build_summary;
use crate::ephemeris::{
    Body, HouseSystem, HouseSystemProvider, PositionProvider, ZodiacMode,
};
use crate::error::ChartError;
use crate::houses::{locate_house, normalize_cusps};
use crate::locate::{GeocodedPlace, Geocoder, TimezoneResolver};
use crate::search::SearchSettings;
use crate::western::{normalize_degrees, to_sign_position, DignitiesService};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;

/// Geocoded place plus the zone id covering it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlace {
    pub place: GeocodedPlace,
    pub timezone: String,
}

/// Zodiac and house system, validated before any lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartFrame {
    pub zodiac: ZodiacMode,
    pub system: HouseSystem,
}

impl ChartFrame {
    pub fn from_request(request: &ChartRequest) -> Result<Self, ChartError> {
        Ok(Self {
            zodiac: request.resolve_zodiac()?,
            system: request.resolve_house_system()?,
        })
    }
}

pub struct ChartAssembler {
    positions: Arc<dyn PositionProvider>,
    houses: Arc<dyn HouseSystemProvider>,
    geocoder: Arc<dyn Geocoder>,
    timezones: Arc<dyn TimezoneResolver>,
    search: SearchSettings,
    dignities: DignitiesService,
    aspects: AspectCalculator,
}

impl ChartAssembler {
    pub fn new(
        positions: Arc<dyn PositionProvider>,
        houses: Arc<dyn HouseSystemProvider>,
        geocoder: Arc<dyn Geocoder>,
        timezones: Arc<dyn TimezoneResolver>,
    ) -> Self {
        Self {
            positions,
            houses,
            geocoder,
            timezones,
            search: SearchSettings::default(),
            dignities: DignitiesService::default(),
            aspects: AspectCalculator::new(),
        }
    }

    pub fn with_search(mut self, search: SearchSettings) -> Self {
        self.search = search;
        self
    }

    pub fn with_dignities(mut self, dignities: DignitiesService) -> Self {
        self.dignities = dignities;
        self
    }

    pub fn search_settings(&self) -> &SearchSettings {
        &self.search
    }

    pub(crate) fn timezones(&self) -> &dyn TimezoneResolver {
        self.timezones.as_ref()
    }

    /// Geocode `place` and resolve its timezone.
    pub fn resolve_place(&self, place: &str) -> Result<ResolvedPlace, ChartError> {
        let place = self.geocoder.geocode(place)?;
        let timezone = self.timezones.resolve_timezone(place.location)?;
        Ok(ResolvedPlace { place, timezone })
    }

    /// Longitude of `body` at `at`, for search metrics.
    pub fn body_longitude(
        &self,
        at: DateTime<Utc>,
        body: Body,
        zodiac: ZodiacMode,
    ) -> Result<f64, ChartError> {
        Ok(self.positions.position(at, body, zodiac)?.longitude)
    }

    pub fn natal_chart(&self, request: &ChartRequest) -> Result<ChartSnapshot, ChartError> {
        self.cast(request).map(|(_, _, chart)| chart)
    }

    /// Natal chart together with the frame and site it was cast for, so
    /// derived techniques do not look the place up again.
    pub(crate) fn cast(
        &self,
        request: &ChartRequest,
    ) -> Result<(ChartFrame, ResolvedPlace, ChartSnapshot), ChartError> {
        let (frame, site) = self.prepare(request)?;
        let local = request.local_datetime();
        let utc = self.timezones.local_to_utc(local, &site.timezone)?;
        log::info!(
            "Casting chart for {} at {} ({} -> {})",
            site.place.address,
            local,
            site.timezone,
            utc
        );
        let chart = self.chart_at(request, frame, &site, local, utc)?;
        Ok((frame, site, chart))
    }

    /// Validate the frame, then resolve the place.
    pub(crate) fn prepare(&self, request: &ChartRequest) -> Result<(ChartFrame, ResolvedPlace), ChartError> {
        let frame = ChartFrame::from_request(request)?;
        let site = self.resolve_place(&request.place)?;
        Ok((frame, site))
    }

    /// Full chart at `utc`; `local` is what the metadata reports as the
    /// birth date and time.
    pub(crate) fn chart_at(
        &self,
        request: &ChartRequest,
        frame: ChartFrame,
        site: &ResolvedPlace,
        local: NaiveDateTime,
        utc: DateTime<Utc>,
    ) -> Result<ChartSnapshot, ChartError> {
        let location = site.place.location;
        let house_frame = self.houses.houses(utc, location, frame.system, frame.zodiac)?;
        let cusps = normalize_cusps(&house_frame.cusps);

        let houses = cusps
            .iter()
            .enumerate()
            .map(|(i, &cusp)| HouseCusp {
                index: i as u8 + 1,
                longitude: round6(cusp),
                position: to_sign_position(cusp),
            })
            .collect();

        let mut planets = Vec::with_capacity(Body::TRACKED.len());
        let mut aspect_input = Vec::with_capacity(Body::TRACKED.len());
        for body in Body::TRACKED {
            let pos = self.positions.position(utc, body, frame.zodiac)?;
            let longitude = normalize_degrees(pos.longitude);
            let (house, house_fallback) = match locate_house(longitude, &cusps) {
                Some(house) => (house, false),
                None => {
                    log::warn!(
                        "{} at {:.4} falls in no house interval; cusps are degenerate, using house 1",
                        body,
                        longitude
                    );
                    (1, true)
                }
            };
            planets.push(PlanetPosition {
                name: body,
                longitude: round6(longitude),
                latitude: round6(pos.latitude),
                speed: round6(pos.speed),
                position: to_sign_position(longitude),
                house,
                house_fallback,
                retrograde: pos.is_retrograde(),
                dignities: self.dignities.get_dignities(body, longitude),
            });
            aspect_input.push(AspectBody {
                body,
                longitude,
                speed: pos.speed,
            });
        }

        let aspects = self.aspects.find_aspects(&aspect_input, &request.orbs);
        let points = chart_points(
            house_frame.ascendant,
            house_frame.midheaven,
            house_frame.vertex,
            &planets,
        );
        let summary = build_summary(&planets, &points, request.language);

        let metadata = ChartMetadata {
            subject_name: request.subject_name.clone(),
            place: site.place.address.clone(),
            birth_date: local.format("%Y-%m-%d").to_string(),
            birth_time: local.format("%H:%M:%S").to_string(),
            timezone: site.timezone.clone(),
            utc_datetime: utc.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            latitude: round6(location.lat),
            longitude: round6(location.lon),
            zodiac: request.zodiac,
            house_system: frame.system.code().to_string(),
            sidereal_mode: match frame.zodiac {
                ZodiacMode::Sidereal(ayanamsa) => Some(ayanamsa.key().to_string()),
                ZodiacMode::Tropical => None,
            },
            ephemeris_flags: vec![self.positions.source_flag(), frame.zodiac.flag()],
            language: request.language,
        };

        Ok(ChartSnapshot {
            metadata,
            points,
            houses,
            planets,
            aspects,
            summary,
        })
    }
}

/// Angles plus the Part of Fortune. A Sun in houses 7-12 is above the
/// horizon and uses the day formula.
fn chart_points(
    ascendant: f64,
    midheaven: f64,
    vertex: Option<f64>,
    planets: &[PlanetPosition],
) -> ChartPoints {
    let find = |body: Body| planets.iter().find(|p| p.name == body);
    let fortune = match (find(Body::Sun), find(Body::Moon)) {
        (Some(sun), Some(moon)) => {
            let lon = if sun.house >= 7 {
                ascendant + moon.longitude - sun.longitude
            } else {
                ascendant + sun.longitude - moon.longitude
            };
            Some(AnglePoint::at(normalize_degrees(lon)))
        }
        _ => None,
    };

    ChartPoints {
        asc: AnglePoint::at(normalize_degrees(ascendant)),
        mc: AnglePoint::at(normalize_degrees(midheaven)),
        dc: AnglePoint::at(normalize_degrees(ascendant + 180.0)),
        ic: AnglePoint::at(normalize_degrees(midheaven + 180.0)),
        vertex: vertex.map(|v| AnglePoint::at(normalize_degrees(v))),
        fortune,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planet(name: Body, longitude: f64, house: u8) -> PlanetPosition {
        PlanetPosition {
            name,
            longitude,
            latitude: 0.0,
            speed: 1.0,
            position: to_sign_position(longitude),
            house,
            house_fallback: false,
            retrograde: false,
            dignities: Vec::new(),
        }
    }

    #[test]
    fn test_angles_are_opposed() {
        let points = chart_points(350.0, 260.0, None, &[]);
        assert_eq!(points.dc.longitude, 170.0);
        assert_eq!(points.ic.longitude, 80.0);
        assert!(points.fortune.is_none());
        assert!(points.vertex.is_none());
    }

    #[test]
    fn test_part_of_fortune_day_and_night() {
        // Day: Sun above the horizon (house 10)
        let day = [planet(Body::Sun, 100.0, 10), planet(Body::Moon, 150.0, 11)];
        let points = chart_points(200.0, 110.0, None, &day);
        assert_eq!(points.fortune.map(|p| p.longitude), Some(250.0));

        // Night: Sun below the horizon (house 4)
        let night = [planet(Body::Sun, 100.0, 4), planet(Body::Moon, 150.0, 5)];
        let points = chart_points(200.0, 110.0, None, &night);
        assert_eq!(points.fortune.map(|p| p.longitude), Some(150.0));
    }
}
