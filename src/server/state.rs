use crate::geocode::FallbackGeocoder;

pub struct AppState {
    pub geocoder: FallbackGeocoder,
}
