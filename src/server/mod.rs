mod handlers;
mod state;

use axum::Router;
use axum::routing::get;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::geocode::FallbackGeocoder;

pub use handlers::{resolution_response, ApiBody, ApiStatus};

pub const ENDPOINT: &str = "/geocode";

pub fn build_router(geocoder: FallbackGeocoder) -> Router {
    let state = Arc::new(AppState { geocoder });

    Router::new()
        .route(ENDPOINT, get(handlers::geocode).fallback(handlers::method_not_allowed))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, geocoder: FallbackGeocoder) -> std::io::Result<()> {
    let app = build_router(geocoder);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("geocode relay listening on http://{}{}", addr, ENDPOINT);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::testing::StubProvider;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_primary_found() {
        let primary = StubProvider::found("p", 37.4216548, -122.0856374);
        let secondary = StubProvider::found("s", 1.0, 1.0);
        let app = build_router(
            FallbackGeocoder::new(primary.clone()).with_secondary(secondary.clone()),
        );

        let (status, json) =
            get_json(app, "/geocode?address=1600+Amphitheater+Parkway%2C+Mountain+View").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "OK");
        assert_eq!(json["lat"], 37.4216548);
        assert_eq!(json["lng"], -122.0856374);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_to_secondary() {
        let app = build_router(
            FallbackGeocoder::new(StubProvider::transport_error("p"))
                .with_secondary(StubProvider::found("s", 37.42307, -122.08414)),
        );

        let (status, json) = get_json(app, "/geocode?address=Mountain%20View").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "OK");
        assert_eq!(json["lat"], 37.42307);
        assert_eq!(json["lng"], -122.08414);
    }

    #[tokio::test]
    async fn test_primary_not_found_leaves_secondary_untouched() {
        let secondary = StubProvider::found("s", 10.0, 20.0);
        let app = build_router(
            FallbackGeocoder::new(StubProvider::not_found("p")).with_secondary(secondary.clone()),
        );

        let (status, json) = get_json(app, "/geocode?address=Nowhere").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "GEOCODE_NOT_FOUND");
        assert!(json.get("lat").is_none());
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_without_secondary() {
        let app = build_router(FallbackGeocoder::new(StubProvider::protocol_error("p")));

        let (status, json) = get_json(app, "/geocode?address=Stockholm").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "ERROR");
    }

    #[tokio::test]
    async fn test_both_providers_fail() {
        let app = build_router(
            FallbackGeocoder::new(StubProvider::transport_error("p"))
                .with_secondary(StubProvider::protocol_error("s")),
        );

        let (status, json) = get_json(app, "/geocode?address=Stockholm").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "ERROR");
    }

    #[tokio::test]
    async fn test_missing_or_empty_address_is_invalid() {
        for uri in ["/geocode", "/geocode?address=", "/geocode?address=%20%20", "/geocode?city=Oslo"] {
            let primary = StubProvider::found("p", 1.0, 2.0);
            let app = build_router(FallbackGeocoder::new(primary.clone()));

            let (status, json) = get_json(app, uri).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
            assert_eq!(json["status"], "INVALID", "uri: {}", uri);
            assert_eq!(primary.calls(), 0, "uri: {}", uri);
        }
    }

    #[tokio::test]
    async fn test_non_get_method_gets_json_body() {
        let primary = StubProvider::found("p", 1.0, 2.0);
        let app = build_router(FallbackGeocoder::new(primary.clone()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/geocode?address=Oslo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "INVALID");
        assert!(json["message"].is_string());
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let primary = StubProvider::found("p", 1.0, 2.0);
        let app = build_router(FallbackGeocoder::new(primary.clone()));

        let (status, json) = get_json(app, "/api/geocode?address=Oslo").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "NOT_FOUND");
        assert_eq!(primary.calls(), 0);
    }
}
