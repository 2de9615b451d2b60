//! Test doubles for the provider contract.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::types::{Coordinate, GeocodeProvider, Outcome, ProviderError};

/// Provider that returns a canned outcome and counts its calls.
pub struct StubProvider {
    name: &'static str,
    outcome: Outcome,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(name: &'static str, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn found(name: &'static str, lat: f64, lng: f64) -> Arc<Self> {
        Self::new(name, Outcome::Found(Coordinate::new(lat, lng)))
    }

    pub fn not_found(name: &'static str) -> Arc<Self> {
        Self::new(name, Outcome::NotFound)
    }

    pub fn transport_error(name: &'static str) -> Arc<Self> {
        Self::new(name, Outcome::Error(ProviderError::Transport("connection refused".into())))
    }

    pub fn protocol_error(name: &'static str) -> Arc<Self> {
        Self::new(name, Outcome::Error(ProviderError::Protocol("unexpected body".into())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeocodeProvider for StubProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn geocode(&self, _address: &str) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
