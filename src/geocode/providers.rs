//! Geocoding providers: Google Maps and HERE.
//!
//! Each provider performs one blocking HTTPS GET via `ureq` and parses the
//! JSON body into an [`Outcome`]. Parsing is split out so it can be tested
//! without the network.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::types::{Coordinate, GeocodeProvider, Outcome, ProviderError};

const USER_AGENT: &str = concat!("GeocodeRelay/", env!("CARGO_PKG_VERSION"));

pub const GOOGLE_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const HERE_BASE_URL: &str = "https://geocoder.api.here.com/6.2/geocode.json";

// ─── Shared HTTP plumbing ───────────────────────────────────────

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Issue one GET and return the raw body.
fn fetch(agent: &ureq::Agent, url: &str, params: &[(&str, &str)]) -> Result<String, ProviderError> {
    let mut request = agent.get(url);
    for (key, value) in params {
        request = request.query(key, value);
    }

    let response = request.call().map_err(|e| match e {
        ureq::Error::Status(code, _) => {
            ProviderError::Protocol(format!("unexpected HTTP status {}", code))
        }
        ureq::Error::Transport(t) => ProviderError::Transport(t.to_string()),
    })?;

    response
        .into_string()
        .map_err(|e| ProviderError::Transport(e.to_string()))
}

fn into_outcome(lookup: Result<Option<Coordinate>, ProviderError>) -> Outcome {
    match lookup {
        Ok(Some(c)) => Outcome::Found(c),
        Ok(None) => Outcome::NotFound,
        Err(e) => Outcome::Error(e),
    }
}

// ─── Google Maps ────────────────────────────────────────────────

#[derive(Deserialize)]
struct GoogleResponse {
    status: Option<String>,
    error_message: Option<String>,
    results: Option<Vec<GoogleResult>>,
}

#[derive(Deserialize)]
struct GoogleResult {
    geometry: Option<GoogleGeometry>,
}

#[derive(Deserialize)]
struct GoogleGeometry {
    location: Option<GoogleLocation>,
}

#[derive(Deserialize)]
struct GoogleLocation {
    lat: f64,
    lng: f64,
}

/// Provider backed by the Google Maps Geocoding API.
pub struct GoogleProvider {
    api_key: String,
    base_url: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl GoogleProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GOOGLE_BASE_URL.to_string(),
            timeout,
            agent: build_agent(timeout),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl GeocodeProvider for GoogleProvider {
    fn name(&self) -> &str {
        "GoogleGeocoder"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn geocode(&self, address: &str) -> Outcome {
        let lookup = fetch(
            &self.agent,
            &self.base_url,
            &[("key", self.api_key.as_str()), ("address", address)],
        )
        .and_then(|body| parse_google(&body));
        into_outcome(lookup)
    }
}

/// Parse a Google geocode body. The first result wins.
fn parse_google(body: &str) -> Result<Option<Coordinate>, ProviderError> {
    let resp: GoogleResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Protocol(format!("invalid JSON: {}", e)))?;

    // Google reports auth and quota problems in-band with HTTP 200.
    if let Some(status) = resp.status.as_deref() {
        if status != "OK" && status != "ZERO_RESULTS" {
            let detail = resp.error_message.as_deref().unwrap_or("no details");
            return Err(ProviderError::Protocol(format!("{}: {}", status, detail)));
        }
    }

    let results = resp
        .results
        .ok_or_else(|| ProviderError::Protocol("unexpected provider response".into()))?;

    let Some(first) = results.into_iter().next() else {
        debug!("no latlng found");
        return Ok(None);
    };

    Ok(first
        .geometry
        .and_then(|g| g.location)
        .map(|l| Coordinate::new(l.lat, l.lng)))
}

// ─── HERE ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct HereEnvelope {
    #[serde(rename = "Response")]
    response: Option<HereResponse>,
}

#[derive(Deserialize)]
struct HereResponse {
    #[serde(rename = "View")]
    view: Vec<HereView>,
}

#[derive(Deserialize)]
struct HereView {
    #[serde(rename = "Result")]
    result: Vec<HereResult>,
}

#[derive(Deserialize)]
struct HereResult {
    #[serde(rename = "Location")]
    location: HereLocation,
}

#[derive(Deserialize)]
struct HereLocation {
    #[serde(rename = "NavigationPosition", default)]
    navigation_position: Vec<HerePosition>,
    #[serde(rename = "DisplayPosition")]
    display_position: Option<HerePosition>,
}

#[derive(Deserialize)]
struct HerePosition {
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

/// Provider backed by the HERE Geocoder API (app id + app code auth).
pub struct HereProvider {
    app_id: String,
    app_code: String,
    base_url: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl HereProvider {
    pub fn new(app_id: impl Into<String>, app_code: impl Into<String>, timeout: Duration) -> Self {
        Self {
            app_id: app_id.into(),
            app_code: app_code.into(),
            base_url: HERE_BASE_URL.to_string(),
            timeout,
            agent: build_agent(timeout),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl GeocodeProvider for HereProvider {
    fn name(&self) -> &str {
        "HeremapsGeocoder"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn geocode(&self, address: &str) -> Outcome {
        let lookup = fetch(
            &self.agent,
            &self.base_url,
            &[
                ("app_id", self.app_id.as_str()),
                ("app_code", self.app_code.as_str()),
                ("searchtext", address),
            ],
        )
        .and_then(|body| parse_here(&body));
        into_outcome(lookup)
    }
}

/// Parse a HERE geocode body.
///
/// `View` and `Result` must be present; an empty `View` or an empty first
/// `Result` list means zero matches. Prefers the navigation position of the
/// first result, falling back to its display position.
fn parse_here(body: &str) -> Result<Option<Coordinate>, ProviderError> {
    let envelope: HereEnvelope = serde_json::from_str(body)
        .map_err(|e| ProviderError::Protocol(format!("invalid JSON: {}", e)))?;

    let response = envelope
        .response
        .ok_or_else(|| ProviderError::Protocol("unexpected provider response".into()))?;

    let result = response
        .view
        .into_iter()
        .next()
        .and_then(|v| v.result.into_iter().next());

    let Some(result) = result else {
        debug!("no latlng found");
        return Ok(None);
    };

    let location = result.location;
    location
        .navigation_position
        .into_iter()
        .next()
        .or(location.display_position)
        .map(|p| Some(Coordinate::new(p.latitude, p.longitude)))
        .ok_or_else(|| ProviderError::Protocol("result has no position".into()))
}
