//! Fallback geocoder: orchestrates the primary → secondary chain.
//!
//! Flow:  primary → (hard failure only) secondary → done
//!
//! A primary `NotFound` is authoritative by default and never reaches the
//! secondary; see [`FallbackPolicy`].

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::types::{GeocodeProvider, Outcome, Resolution};

/// What a primary `NotFound` means for the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// "Address does not exist" from the primary is final.
    #[default]
    AuthoritativeNotFound,
    /// Also ask the secondary when the primary finds nothing.
    RetryOnNotFound,
}

/// Primary provider with an optional secondary, tried strictly in order.
pub struct FallbackGeocoder {
    primary: Arc<dyn GeocodeProvider>,
    secondary: Option<Arc<dyn GeocodeProvider>>,
    policy: FallbackPolicy,
}

impl FallbackGeocoder {
    pub fn new(primary: Arc<dyn GeocodeProvider>) -> Self {
        Self {
            primary,
            secondary: None,
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn GeocodeProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    pub fn secondary_name(&self) -> Option<&str> {
        self.secondary.as_deref().map(|p| p.name())
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Resolve an address through the fallback chain.
    ///
    /// The address must already be validated as non-empty.
    pub fn resolve(&self, address: &str) -> Resolution {
        let primary = attempt(self.primary.as_ref(), address);

        let primary_not_found = match primary {
            Outcome::Found(c) => return Resolution::Found(c),
            Outcome::NotFound if self.policy == FallbackPolicy::AuthoritativeNotFound => {
                return Resolution::NotFound;
            }
            Outcome::NotFound => true,
            Outcome::Error(ref e) => {
                error!(provider = self.primary.name(), error = %e, "primary provider failed");
                false
            }
        };

        let Some(secondary) = self.secondary.as_deref() else {
            warn!("secondary provider not available");
            return if primary_not_found {
                Resolution::NotFound
            } else {
                Resolution::Unavailable
            };
        };

        match attempt(secondary, address) {
            Outcome::Found(c) => Resolution::Found(c),
            Outcome::NotFound => Resolution::NotFound,
            Outcome::Error(e) => {
                error!(provider = secondary.name(), error = %e, "secondary provider failed");
                // The primary already gave a definite answer.
                if primary_not_found {
                    Resolution::NotFound
                } else {
                    Resolution::Unavailable
                }
            }
        }
    }
}

fn attempt(provider: &dyn GeocodeProvider, address: &str) -> Outcome {
    debug!(
        provider = provider.name(),
        timeout_secs = provider.timeout().as_secs(),
        "fetching geocode"
    );
    let outcome = provider.geocode(address);
    match &outcome {
        Outcome::Found(c) => {
            info!(provider = provider.name(), outcome = outcome.class(), %address, coords = %c, "geocode found")
        }
        _ => debug!(provider = provider.name(), outcome = outcome.class(), "geocode attempt finished"),
    }
    outcome
}
