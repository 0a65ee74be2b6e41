use astrolumen::chart::{
    ChartRequest, LunationPhase, LunationRequest, ProgressionRequest, SolarReturnRequest,
};
use astrolumen::ephemeris::{
    Body, EclipticPosition, GeoLocation, HouseFrame, HouseSystem, HouseSystemProvider,
    MeanMotionEphemeris, PositionProvider, ZodiacKind, ZodiacMode,
};
use astrolumen::search::normalize_signed;
use astrolumen::western::ZodiacSign;
use astrolumen::locate::{GeocodedPlace, Geocoder};
use astrolumen::{
    ChartAssembler, ChartError, ErrorKind, IanaTimezones, Language, StaticGeocoder,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed longitudes, independent of time
struct FixedPositions {
    failing: Option<Body>,
}

impl PositionProvider for FixedPositions {
    fn position(
        &self,
        at: DateTime<Utc>,
        body: Body,
        _zodiac: ZodiacMode,
    ) -> Result<EclipticPosition, ChartError> {
        if self.failing == Some(body) {
            return Err(ChartError::CalculationFailed {
                body: body.to_string(),
                datetime: at,
                message: "stub failure".to_string(),
            });
        }
        let index = Body::TRACKED.iter().position(|b| *b == body).unwrap_or(0) as f64;
        Ok(EclipticPosition {
            longitude: 5.0 + index * 29.0,
            latitude: 0.1,
            speed: if body == Body::TrueNode { -0.05 } else { 1.0 - index * 0.05 },
        })
    }

    fn source_flag(&self) -> String {
        "STUB".to_string()
    }
}

/// Equal houses from 0° Aries, or all cusps equal when degenerate
struct FixedHouses {
    degenerate: bool,
}

impl HouseSystemProvider for FixedHouses {
    fn houses(
        &self,
        _at: DateTime<Utc>,
        _location: GeoLocation,
        _system: HouseSystem,
        _zodiac: ZodiacMode,
    ) -> Result<HouseFrame, ChartError> {
        let cusps = if self.degenerate {
            vec![0.0; 12]
        } else {
            (0..12).map(|i| i as f64 * 30.0).collect()
        };
        Ok(HouseFrame {
            cusps,
            ascendant: 0.0,
            midheaven: 270.0,
            vertex: Some(190.0),
        })
    }
}

/// Sun parked at 100° before 2000 and at 200° after, so no return is ever
/// bracketed in later years
struct JumpingSun;

impl PositionProvider for JumpingSun {
    fn position(
        &self,
        at: DateTime<Utc>,
        body: Body,
        zodiac: ZodiacMode,
    ) -> Result<EclipticPosition, ChartError> {
        let mut position = FixedPositions { failing: None }.position(at, body, zodiac)?;
        if body == Body::Sun {
            let jump = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
            position.longitude = if at < jump { 100.0 } else { 200.0 };
        }
        Ok(position)
    }

    fn source_flag(&self) -> String {
        "STUB".to_string()
    }
}

/// Counts lookups that reach the wrapped geocoder
struct CountingGeocoder {
    inner: StaticGeocoder,
    calls: Arc<AtomicUsize>,
}

impl Geocoder for CountingGeocoder {
    fn geocode(&self, place: &str) -> Result<GeocodedPlace, ChartError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.geocode(place)
    }
}

fn geocoder() -> Arc<StaticGeocoder> {
    Arc::new(
        StaticGeocoder::new()
            .with_place("Recife", -8.05, -34.9, Some("Recife, Pernambuco, Brasil"))
            .with_place("London", 51.5074, -0.1278, None),
    )
}

/// Recife pinned to its nautical zone so expected instants stay fixed;
/// elsewhere the nautical fallback applies.
fn timezones() -> Arc<IanaTimezones> {
    Arc::new(
        IanaTimezones::empty()
            .with_zone("Etc/GMT+2", -8.05, -34.9)
            .unwrap(),
    )
}

fn stub_assembler(failing: Option<Body>, degenerate: bool) -> ChartAssembler {
    ChartAssembler::new(
        Arc::new(FixedPositions { failing }),
        Arc::new(FixedHouses { degenerate }),
        geocoder(),
        timezones(),
    )
}

fn mean_motion_assembler() -> ChartAssembler {
    let ephemeris = Arc::new(MeanMotionEphemeris::new());
    ChartAssembler::new(
        ephemeris.clone(),
        ephemeris,
        geocoder(),
        timezones(),
    )
}

fn request(place: &str) -> ChartRequest {
    ChartRequest::new(
        NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
        place,
    )
}

#[test]
fn test_natal_chart_is_byte_identical_across_runs() {
    let assembler = stub_assembler(None, false);
    let req = request("Recife");
    let first = serde_json::to_string(&assembler.natal_chart(&req).unwrap()).unwrap();
    let second = serde_json::to_string(&assembler.natal_chart(&req).unwrap()).unwrap();
    assert_eq!(first, second);

    let assembler = mean_motion_assembler();
    let first = assembler.natal_chart(&req).unwrap().to_json().unwrap();
    let second = assembler.natal_chart(&req).unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_natal_chart_contents() {
    let assembler = stub_assembler(None, false);
    let chart = assembler.natal_chart(&request("  recife ")).unwrap();

    let meta = &chart.metadata;
    assert_eq!(meta.place, "Recife, Pernambuco, Brasil");
    assert_eq!(meta.timezone, "Etc/GMT+2");
    assert_eq!(meta.birth_date, "1990-01-01");
    assert_eq!(meta.birth_time, "12:30:00");
    assert_eq!(meta.utc_datetime, "1990-01-01T14:30:00Z");
    assert_eq!(meta.house_system, "P");
    assert_eq!(meta.ephemeris_flags, vec!["STUB", "TROPICAL"]);
    assert_eq!(meta.sidereal_mode, None);

    assert_eq!(chart.houses.len(), 12);
    assert_eq!(chart.houses[3].index, 4);
    assert_eq!(chart.planets.len(), Body::TRACKED.len());

    let sun = chart.planet(Body::Sun).unwrap();
    assert_eq!(sun.position.sign, ZodiacSign::Aries);
    assert_eq!(sun.house, 1);
    assert!(!sun.house_fallback);

    // 5 + 29 * 4 = 121: Mars in Leo, fifth house
    let mars = chart.planet(Body::Mars).unwrap();
    assert_eq!(mars.position.sign, ZodiacSign::Leo);
    assert_eq!(mars.house, 5);

    let node = chart.planet(Body::TrueNode).unwrap();
    assert!(node.retrograde);

    assert_eq!(chart.points.dc.longitude, 180.0);
    assert_eq!(chart.points.ic.longitude, 90.0);
    assert_eq!(chart.points.vertex.map(|v| v.longitude), Some(190.0));
    assert!(chart.points.fortune.is_some());

    assert_eq!(chart.summary[0], "Sol em Áries (Fogo, Cardinal)");
    assert_eq!(chart.summary.last().unwrap(), "MC em Capricórnio");
}

#[test]
fn test_english_summary_and_orb_override() {
    let assembler = stub_assembler(None, false);
    let mut req = request("Recife");
    req.language = Language::En;
    let default_aspects = assembler.natal_chart(&req).unwrap().aspects.len();

    req.orbs.conjunction = None;
    req.orbs.opposition = None;
    req.orbs.square = None;
    req.orbs.trine = None;
    req.orbs.sextile = None;
    let chart = assembler.natal_chart(&req).unwrap();
    assert!(chart.aspects.is_empty());
    assert!(default_aspects > 0);
    assert_eq!(chart.summary[0], "Sun in Aries (Fire, Cardinal)");
}

#[test]
fn test_degenerate_cusps_are_flagged() {
    let assembler = stub_assembler(None, true);
    let chart = assembler.natal_chart(&request("Recife")).unwrap();
    assert!(chart.planets.iter().all(|p| p.house == 1 && p.house_fallback));
}

#[test]
fn test_sidereal_chart_metadata() {
    let assembler = mean_motion_assembler();
    let mut req = request("London");
    req.zodiac = ZodiacKind::Sidereal;
    req.sidereal_mode = Some("fagan_bradley".to_string());
    let chart = assembler.natal_chart(&req).unwrap();
    assert_eq!(chart.metadata.sidereal_mode.as_deref(), Some("FAGAN_BRADLEY"));
    assert_eq!(
        chart.metadata.ephemeris_flags,
        vec!["MOCK_MODE", "SIDEREAL_MODE=FAGAN_BRADLEY"]
    );
    assert_eq!(chart.metadata.timezone, "UTC");
}

#[test]
fn test_configuration_and_lookup_errors() {
    let assembler = stub_assembler(None, false);

    let mut req = request("Recife");
    req.house_system = "X".to_string();
    let err = assembler.natal_chart(&req).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

    let mut req = request("Recife");
    req.zodiac = ZodiacKind::Sidereal;
    req.sidereal_mode = Some("NOT_A_MODE".to_string());
    let err = assembler.natal_chart(&req).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

    let err = assembler.natal_chart(&request("Atlantis")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LookupFailure);
    assert!(err.is_caller_facing());
}

#[test]
fn test_provider_failure_is_a_computation_error() {
    let assembler = stub_assembler(Some(Body::Chiron), false);
    let err = assembler.natal_chart(&request("Recife")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ComputationFailure);
    assert!(!err.is_caller_facing());
}

#[test]
fn test_solar_return_fails_without_natal_sun() {
    let assembler = stub_assembler(Some(Body::Sun), false);
    let req = SolarReturnRequest {
        chart: request("Recife"),
        year: 2024,
    };
    let err = assembler.solar_return(&req).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ComputationFailure);
}

#[test]
fn test_solar_return_finds_natal_sun() {
    let assembler = mean_motion_assembler();
    let req = SolarReturnRequest {
        chart: request("Recife"),
        year: 2024,
    };
    let result = assembler.solar_return(&req).unwrap();
    assert!(!result.approximate);
    assert!(result.residual_deg.abs() < 1e-4);
    assert_eq!(result.return_utc.year(), 2024);

    let sun = result.chart.planet(Body::Sun).unwrap();
    assert!(normalize_signed(sun.longitude - result.natal_sun_longitude).abs() < 1e-3);
    assert!(result.chart.metadata.birth_date.starts_with("2024-"));
}

#[test]
fn test_stationary_sun_hits_at_window_start() {
    // The stub Sun never moves, so the first sample is already exact
    let assembler = stub_assembler(None, false);
    let req = SolarReturnRequest {
        chart: request("Recife"),
        year: 2000,
    };
    let result = assembler.solar_return(&req).unwrap();
    assert!(!result.approximate);
    assert_eq!(result.residual_deg, 0.0);
    assert_eq!(result.return_utc.to_rfc3339(), "1999-12-29T14:30:00+00:00");
}

#[test]
fn test_progression_offset_applied_to_birth() {
    let assembler = mean_motion_assembler();
    let req = ProgressionRequest {
        chart: request("Recife"),
        target_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    };
    let result = assembler.progression(&req).unwrap();
    assert_eq!(result.elapsed_days, 12418);
    assert!((result.offset_days - 34.0).abs() < 0.01);
    assert_eq!(
        result.progressed_local.date(),
        NaiveDate::from_ymd_opt(1990, 2, 4).unwrap()
    );
    assert_eq!(result.chart.metadata.birth_date, "1990-02-04");
}

#[test]
fn test_new_and_full_moon() {
    let assembler = mean_motion_assembler();
    let reference = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

    let new_moon = assembler
        .lunation(&LunationRequest::new(reference, LunationPhase::New))
        .unwrap();
    assert!(!new_moon.approximate);
    assert!(normalize_signed(new_moon.moon_longitude - new_moon.sun_longitude).abs() < 1e-3);

    let full_moon = assembler
        .lunation(&LunationRequest::new(reference, LunationPhase::Full))
        .unwrap();
    assert!(!full_moon.approximate);
    let elongation = normalize_signed(full_moon.moon_longitude - full_moon.sun_longitude);
    assert!((elongation.abs() - 180.0).abs() < 1e-3);

    let lag = (full_moon.utc - new_moon.utc).num_hours().abs();
    assert!((300..=420).contains(&lag), "new/full moons {} hours apart", lag);
}

#[test]
fn test_lunation_rejects_bad_sidereal_key() {
    let assembler = mean_motion_assembler();
    let mut req = LunationRequest::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), LunationPhase::New);
    req.zodiac = ZodiacKind::Sidereal;
    req.sidereal_mode = Some("BOGUS".to_string());
    let err = assembler.lunation(&req).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
}

#[test]
fn test_unbracketed_solar_return_is_marked_approximate() {
    let assembler = ChartAssembler::new(
        Arc::new(JumpingSun),
        Arc::new(FixedHouses { degenerate: false }),
        geocoder(),
        timezones(),
    );
    let req = SolarReturnRequest {
        chart: request("Recife"),
        year: 2024,
    };
    let result = assembler.solar_return(&req).unwrap();
    assert!(result.approximate);
    assert_eq!(result.natal_sun_longitude, 100.0);
    assert_eq!(result.residual_deg, 100.0);
    // every sample misses equally, so the window start is kept
    assert_eq!(result.return_utc.to_rfc3339(), "2023-12-29T14:30:00+00:00");
    assert_eq!(result.chart.planet(Body::Sun).unwrap().longitude, 200.0);
}

#[test]
fn test_unbracketed_lunation_is_marked_approximate() {
    // stub Moon sits a constant 29° ahead of the stub Sun
    let assembler = stub_assembler(None, false);
    let reference = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let event = assembler
        .lunation(&LunationRequest::new(reference, LunationPhase::New))
        .unwrap();
    assert!(event.approximate);
    assert_eq!(event.residual_deg, 29.0);
    assert_eq!(event.utc.to_rfc3339(), "2024-03-01T00:00:00+00:00");
}

#[test]
fn test_solar_return_at_calendar_end_is_rejected() {
    let assembler = stub_assembler(None, false);
    let req = SolarReturnRequest {
        chart: ChartRequest::new(
            NaiveDate::from_ymd_opt(1990, 12, 30).unwrap(),
            NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            "Recife",
        ),
        year: 262143,
    };
    let err = assembler.solar_return(&req).unwrap_err();
    assert!(matches!(err, ChartError::InvalidDate { .. }), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
}

#[test]
fn test_lunation_at_calendar_end_is_rejected() {
    let assembler = stub_assembler(None, false);
    let err = assembler
        .lunation(&LunationRequest::new(NaiveDate::MAX, LunationPhase::Full))
        .unwrap_err();
    assert!(matches!(err, ChartError::InvalidDate { .. }), "{err:?}");
}

#[test]
fn test_solar_return_geocodes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let geocoder = CountingGeocoder {
        inner: StaticGeocoder::new().with_place("Recife", -8.05, -34.9, None),
        calls: calls.clone(),
    };
    let ephemeris = Arc::new(MeanMotionEphemeris::new());
    let assembler = ChartAssembler::new(ephemeris.clone(), ephemeris, Arc::new(geocoder), timezones());
    let req = SolarReturnRequest {
        chart: request("Recife"),
        year: 2024,
    };
    assembler.solar_return(&req).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
