use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::geocode::Resolution;

use super::state::AppState;

// ─── Response body ───────────────────────────────────────────────

/// Status values the service can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiStatus {
    Ok,
    GeocodeNotFound,
    Invalid,
    Error,
    NotFound,
}

#[derive(Debug, Serialize)]
pub struct ApiBody {
    pub status: ApiStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn message(code: StatusCode, status: ApiStatus, msg: &str) -> Response {
    let body = ApiBody {
        status,
        lat: None,
        lng: None,
        message: Some(msg.to_string()),
    };
    (code, Json(body)).into_response()
}

/// Map a fallback resolution to its HTTP response.
pub fn resolution_response(resolution: Resolution) -> Response {
    match resolution {
        Resolution::Found(c) => {
            let body = ApiBody {
                status: ApiStatus::Ok,
                lat: Some(c.lat),
                lng: Some(c.lng),
                message: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Resolution::NotFound => message(
            StatusCode::OK,
            ApiStatus::GeocodeNotFound,
            "Geocode not found for given address",
        ),
        Resolution::Unavailable => message(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiStatus::Error,
            "Server error occurred. Please try again later.",
        ),
    }
}

// ─── GET /geocode ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GeocodeQuery {
    pub address: Option<String>,
}

pub async fn geocode(
    State(state): State<Arc<AppState>>,
    query: Result<Query<GeocodeQuery>, QueryRejection>,
) -> Response {
    let start = Instant::now();

    let address = match query {
        Ok(Query(params)) => params.address.unwrap_or_default(),
        Err(rejection) => {
            warn!(error = %rejection, "malformed query string");
            String::new()
        }
    };
    let address = address.trim().to_string();
    if address.is_empty() {
        warn!("address not provided");
        return message(StatusCode::BAD_REQUEST, ApiStatus::Invalid, "Address is missing");
    }

    // Provider calls block on network I/O.
    let lookup = address.clone();
    let resolution = match tokio::task::spawn_blocking(move || state.geocoder.resolve(&lookup)).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "geocode task failed");
            Resolution::Unavailable
        }
    };

    info!(
        %address,
        result = %resolution,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "GET /geocode",
    );

    resolution_response(resolution)
}

// ─── Fallback ────────────────────────────────────────────────────

pub async fn not_found() -> Response {
    message(StatusCode::NOT_FOUND, ApiStatus::NotFound, "Endpoint not found.")
}

pub async fn method_not_allowed() -> Response {
    message(
        StatusCode::METHOD_NOT_ALLOWED,
        ApiStatus::Invalid,
        "Only GET is supported.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::Coordinate;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&ApiStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(
            serde_json::to_string(&ApiStatus::GeocodeNotFound).unwrap(),
            "\"GEOCODE_NOT_FOUND\""
        );
        assert_eq!(serde_json::to_string(&ApiStatus::Invalid).unwrap(), "\"INVALID\"");
        assert_eq!(serde_json::to_string(&ApiStatus::Error).unwrap(), "\"ERROR\"");
        assert_eq!(serde_json::to_string(&ApiStatus::NotFound).unwrap(), "\"NOT_FOUND\"");
    }

    #[tokio::test]
    async fn test_found_response() {
        let response = resolution_response(Resolution::Found(Coordinate::new(37.4216548, -122.0856374)));
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "OK");
        assert_eq!(json["lat"], 37.4216548);
        assert_eq!(json["lng"], -122.0856374);
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn test_not_found_response_is_not_an_http_error() {
        let response = resolution_response(Resolution::NotFound);
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "GEOCODE_NOT_FOUND");
        assert!(json.get("lat").is_none());
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn test_unavailable_response() {
        let response = resolution_response(Resolution::Unavailable);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["status"], "ERROR");
    }
}
