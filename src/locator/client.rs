//! HTTP clients for geocoding (Nominatim) and nearby pharmacy search
//! (Google Places).

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{Coordinates, Pharmacy};
use crate::config::LocatorConfig;

#[derive(Debug, Clone)]
pub struct LocatorClient {
    http: reqwest::Client,
    config: LocatorConfig,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlacesResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    #[serde(default)]
    vicinity: String,
    geometry: PlaceGeometry,
}

#[derive(Debug, Deserialize)]
struct PlaceGeometry {
    location: PlaceLocation,
}

#[derive(Debug, Deserialize)]
struct PlaceLocation {
    lat: f64,
    lng: f64,
}

impl PlacesResponse {
    /// Anything but `OK` (including `ZERO_RESULTS`) means no pharmacies.
    pub(crate) fn into_pharmacies(self) -> Vec<Pharmacy> {
        if self.status != "OK" {
            tracing::debug!(status = %self.status, "places search returned no usable results");
            return Vec::new();
        }
        self.results
            .into_iter()
            .map(|place| Pharmacy {
                name: place.name,
                address: place.vicinity,
                location: Coordinates::new(place.geometry.location.lat, place.geometry.location.lng),
            })
            .collect()
    }
}

impl LocatorClient {
    pub fn new(config: LocatorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    /// Resolve a free-text place to coordinates. `None` if nothing matched.
    pub async fn geocode(&self, place: &str) -> Result<Option<Coordinates>> {
        let response = self
            .http
            .get(&self.config.nominatim_url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .context("geocoding request failed")?;

        anyhow::ensure!(
            response.status().is_success(),
            "geocoding failed with HTTP {}",
            response.status()
        );

        let places: Vec<NominatimPlace> =
            response.json().await.context("invalid geocoding response")?;

        let Some(first) = places.into_iter().next() else {
            tracing::info!(place, "place not found");
            return Ok(None);
        };
        let latitude = first.lat.parse().context("invalid latitude in geocoding response")?;
        let longitude = first.lon.parse().context("invalid longitude in geocoding response")?;
        Ok(Some(Coordinates::new(latitude, longitude)))
    }

    /// Pharmacies within the configured radius of `location`.
    pub async fn nearby_pharmacies(&self, location: Coordinates) -> Result<Vec<Pharmacy>> {
        if self.config.places_api_key.is_empty() {
            tracing::warn!("no places API key configured, skipping nearby search");
            return Ok(Vec::new());
        }

        let radius = self.config.radius_m.to_string();
        let location_param = location.as_query();
        let response = self
            .http
            .get(&self.config.places_url)
            .query(&[
                ("location", location_param.as_str()),
                ("radius", radius.as_str()),
                ("type", "pharmacy"),
                ("key", self.config.places_api_key.as_str()),
            ])
            .send()
            .await
            .context("places request failed")?;

        let body: PlacesResponse = response.json().await.context("invalid places response")?;
        let pharmacies = body.into_pharmacies();
        tracing::info!(count = pharmacies.len(), "nearby pharmacies found");
        Ok(pharmacies)
    }

    pub fn match_cutoff(&self) -> f64 {
        self.config.match_cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_maps_to_pharmacies() {
        let json = r#"{
            "status": "OK",
            "results": [
                {"name": "City Pharmacy", "vicinity": "12 High Street",
                 "geometry": {"location": {"lat": 12.97, "lng": 77.59}}},
                {"name": "No Address Rx",
                 "geometry": {"location": {"lat": 1.0, "lng": 2.0}}}
            ]
        }"#;
        let response: PlacesResponse = serde_json::from_str(json).unwrap();
        let pharmacies = response.into_pharmacies();
        assert_eq!(pharmacies.len(), 2);
        assert_eq!(pharmacies[0].address, "12 High Street");
        assert_eq!(pharmacies[0].location, Coordinates::new(12.97, 77.59));
        assert_eq!(pharmacies[1].address, "");
    }

    #[test]
    fn non_ok_status_is_empty() {
        let json = r#"{"status": "REQUEST_DENIED", "results": [], "error_message": "bad key"}"#;
        let response: PlacesResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_pharmacies().is_empty());
    }

    #[tokio::test]
    async fn missing_api_key_skips_search() {
        let client = LocatorClient::new(LocatorConfig::default()).unwrap();
        let found = client
            .nearby_pharmacies(Coordinates::new(0.0, 0.0))
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
