#[cfg(feature = "swisseph")]
pub mod adapter;
pub mod mean_motion;
pub mod types;

#[cfg(feature = "swisseph")]
pub use adapter::SwissEphemeris;
pub use mean_motion::{julian_day, MeanMotionEphemeris};
pub use types::{
    Ayanamsa, Body, EclipticPosition, GeoLocation, HouseFrame, HouseSystem, HouseSystemProvider,
    PositionProvider, ZodiacKind, ZodiacMode,
};
