//! Place and timezone collaborators, with bounded memoization in front.

pub mod cache;
pub mod geocode;
pub mod timezone;

pub use cache::{BoundedCache, Clock, SystemClock};
pub use geocode::{
    normalize_place, parse_coordinates, CachedGeocoder, GeocodedPlace, Geocoder, StaticGeocoder,
};
pub use timezone::{
    localize, parse_fixed_zone, CachedTimezoneResolver, IanaTimezones, TimezoneResolver, Zone,
    DEFAULT_ANCHOR_RADIUS_KM,
};
