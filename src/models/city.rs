//! Geocoding candidates and deduplicated cities

use serde::{Deserialize, Serialize};

/// Raw reverse geocoding result as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// A resolved city, unique within a collection run by [`City::key`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
}

impl City {
    #[must_use]
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            country: None,
        }
    }

    /// Identity key: lowercased name plus latitude rounded to 3 decimals.
    ///
    /// Longitude is deliberately not part of the key.
    #[must_use]
    pub fn key(&self) -> String {
        city_key(&self.name, self.lat)
    }
}

impl From<CandidateLocation> for City {
    fn from(candidate: CandidateLocation) -> Self {
        Self {
            name: candidate.name,
            lat: candidate.lat,
            lon: candidate.lon,
            country: candidate.country,
        }
    }
}

/// Build the dedup key for a name/latitude pair
#[must_use]
pub fn city_key(name: &str, lat: f64) -> String {
    // `{:.3}` rounds the exact binary value, ties to even; `+ 0.0` folds -0.0 into 0.0
    let rounded = format!("{lat:.3}").parse::<f64>().unwrap_or(lat) + 0.0;
    format!("{}_{:?}", name.to_lowercase(), rounded)
}
