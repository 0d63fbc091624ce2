//! Address lookup through an external geocoding service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no location found for {0:?}")]
    NoMatch(String),
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned an unexpected payload")]
    InvalidResponse,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

/// Nominatim-compatible search endpoint.
pub struct HttpGeocoder {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGeocoder {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("floorplan-server/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let payload: serde_json::Value = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("limit", "1"), ("q", address)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_search_response(address, &payload)
    }
}

/// Nominatim returns coordinates as strings inside an array of matches.
pub fn parse_search_response(
    address: &str,
    payload: &serde_json::Value,
) -> Result<Coordinates, GeocodeError> {
    let matches = payload.as_array().ok_or(GeocodeError::InvalidResponse)?;
    let Some(first) = matches.first() else {
        return Err(GeocodeError::NoMatch(address.to_string()));
    };
    let coordinate = |field: &str| -> Result<f64, GeocodeError> {
        match &first[field] {
            serde_json::Value::String(text) => {
                text.parse().map_err(|_| GeocodeError::InvalidResponse)
            }
            serde_json::Value::Number(number) => {
                number.as_f64().ok_or(GeocodeError::InvalidResponse)
            }
            _ => Err(GeocodeError::InvalidResponse),
        }
    };
    Ok(Coordinates {
        latitude: coordinate("lat")?,
        longitude: coordinate("lon")?,
    })
}
