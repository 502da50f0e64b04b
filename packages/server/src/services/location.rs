use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GeocodingConfig;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("{0}")]
    InvalidCoordinates(String),
    /// The coordinates could not be placed in any country.
    #[error("no location data for the given coordinates")]
    NoLocationData,
}

/// Failure reported by a reverse-geocoding provider.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider answered {0}")]
    Status(String),
}

/// One address component of a reverse-geocoding result.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GeocodeResult {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

/// Reverse-geocoding collaborator: coordinates to ranked address results.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<Vec<GeocodeResult>, GeocodeError>;
}

/// Place filter derived from a geocode, from most to least specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoFilter {
    pub country: String,
    pub province: Option<String>,
    pub city: Option<String>,
}

impl GeoFilter {
    /// Progressively relaxed filters to try in order. Tiers whose component is
    /// missing are skipped.
    pub fn tiers(&self) -> Vec<GeoFilter> {
        let mut tiers = Vec::with_capacity(3);
        if let (Some(province), Some(city)) = (&self.province, &self.city) {
            tiers.push(GeoFilter {
                country: self.country.clone(),
                province: Some(province.clone()),
                city: Some(city.clone()),
            });
        }
        if let Some(province) = &self.province {
            tiers.push(GeoFilter {
                country: self.country.clone(),
                province: Some(province.clone()),
                city: None,
            });
        }
        tiers.push(GeoFilter {
            country: self.country.clone(),
            province: None,
            city: None,
        });
        tiers
    }
}

/// Pull country, province and city out of the first geocoding result.
pub fn extract_filter(results: &[GeocodeResult]) -> Option<GeoFilter> {
    let first = results.first()?;

    let mut country = None;
    let mut province = None;
    let mut city = None;
    for component in &first.address_components {
        for kind in &component.types {
            match kind.as_str() {
                "country" => country = Some(component.long_name.clone()),
                "administrative_area_level_1" => {
                    let name = component.long_name.as_str();
                    province = Some(name.strip_suffix(" Province").unwrap_or(name).to_string())
                }
                "locality" => city = Some(component.long_name.clone()),
                _ => {}
            }
        }
    }

    Some(GeoFilter {
        country: country?,
        province,
        city,
    })
}

/// Resolve coordinates into a [`GeoFilter`].
///
/// Every provider failure collapses into [`LocationError::NoLocationData`].
pub async fn resolve(geocoder: &dyn Geocoder, lat: f64, lng: f64) -> Result<GeoFilter, LocationError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(LocationError::InvalidCoordinates(format!(
            "Coordinates ({lat}, {lng}) are out of range"
        )));
    }

    let results = geocoder.reverse(lat, lng).await.map_err(|e| {
        warn!(lat, lng, error = %e, "Reverse geocoding failed");
        LocationError::NoLocationData
    })?;

    let filter = extract_filter(&results).ok_or(LocationError::NoLocationData)?;
    debug!(?filter, "Resolved coordinates");
    Ok(filter)
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

/// [`Geocoder`] backed by the Google Geocoding web service.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<Vec<GeocodeResult>, GeocodeError> {
        let response: GeocodeResponse = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latlng", format!("{lat},{lng}")),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response.status.as_str() {
            "OK" => Ok(response.results),
            "ZERO_RESULTS" => Ok(Vec::new()),
            other => Err(GeocodeError::Status(other.to_string())),
        }
    }
}
