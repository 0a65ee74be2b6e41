pub mod aspects;
pub mod chart;
pub mod ephemeris;
pub mod error;
pub mod houses;
pub mod locate;
pub mod search;
pub mod western;

pub use aspects::{AspectBody, AspectCalculator, AspectKind, AspectRecord, OrbConfig};
pub use chart::{
    ChartAssembler, ChartRequest, ChartSnapshot, LunationEvent, LunationPhase, LunationRequest,
    ProgressedChart, ProgressionRequest, SolarReturnChart, SolarReturnRequest,
};
pub use ephemeris::{
    Body, EclipticPosition, GeoLocation, HouseFrame, HouseSystem, HouseSystemProvider,
    MeanMotionEphemeris, PositionProvider, ZodiacKind, ZodiacMode,
};
#[cfg(feature = "swisseph")]
pub use ephemeris::SwissEphemeris;
pub use error::{ChartError, ErrorKind};
pub use locate::{
    CachedGeocoder, CachedTimezoneResolver, Geocoder, IanaTimezones, StaticGeocoder,
    TimezoneResolver,
};
pub use search::{find_event_time, EventSearchWindow, EventTime, SearchSettings};
pub use western::{to_sign_position, Language, SignPosition, ZodiacSign};
