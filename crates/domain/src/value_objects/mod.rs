//! Value Objects - Immutable, identity-less domain primitives

mod geo_location;
mod line_key;
mod transport_mode;

pub use geo_location::GeoLocation;
pub use line_key::LineKey;
pub use transport_mode::TransportMode;
