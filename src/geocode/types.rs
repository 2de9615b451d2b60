//! Core types for the geocoding subsystem.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default remote-call timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A resolved latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// Hard failure reported by a provider.
///
/// The fallback logic does not distinguish between the variants; they exist
/// for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Connection refused, DNS failure, timeout.
    #[error("transport error: {0}")]
    Transport(String),
    /// Unexpected status, malformed or unexpected response body.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result of a single geocode attempt against one provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Found(Coordinate),
    NotFound,
    Error(ProviderError),
}

impl Outcome {
    /// Short label used in log fields.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NotFound => "not_found",
            Self::Error(_) => "error",
        }
    }
}

impl From<ProviderError> for Outcome {
    fn from(err: ProviderError) -> Self {
        Self::Error(err)
    }
}

/// Terminal state of a fallback run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Found(Coordinate),
    NotFound,
    Unavailable,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(c) => write!(f, "Found {}", c),
            Self::NotFound => write!(f, "NotFound"),
            Self::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// A geocoding backend that resolves a free-text address to a coordinate.
///
/// Implementations perform exactly one outbound call per `geocode` and never
/// retry. They are built once at startup and shared across requests, so
/// they must be `Send + Sync` and must not mutate themselves.
pub trait GeocodeProvider: Send + Sync {
    /// Stable identifier, used for diagnostics only.
    fn name(&self) -> &str;

    /// Per-call timeout this provider applies to its remote request.
    fn timeout(&self) -> Duration;

    /// Geocode a non-empty address.
    fn geocode(&self, address: &str) -> Outcome;
}
