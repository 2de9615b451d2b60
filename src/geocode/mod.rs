//! Geocoding subsystem for the relay.
//!
//! Provides the provider contract, the Google and HERE backends, and the
//! primary/secondary fallback geocoder.

pub mod providers;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use providers::{GoogleProvider, HereProvider};
pub use resolver::{FallbackGeocoder, FallbackPolicy};
pub use types::{Coordinate, GeocodeProvider, Outcome, ProviderError, Resolution, DEFAULT_TIMEOUT_SECS};
