//! Bounding box and grid point models

use crate::{CollectorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rectangular region defined by min/max latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

/// A single probe coordinate of the sampling grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub lat: f64,
    pub lon: f64,
}

impl BoundingBox {
    /// Create a bounding box, rejecting inverted or non-finite bounds
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Result<Self> {
        let values = [lat_min, lat_max, lon_min, lon_max];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CollectorError::validation(
                "Coordinates must be finite numbers",
            ));
        }

        if lat_min > lat_max || lon_min > lon_max {
            return Err(CollectorError::validation(
                "Minimum values must be less than or equal to maximum values",
            ));
        }

        Ok(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }

    #[must_use]
    pub fn lat_min(&self) -> f64 {
        self.lat_min
    }

    #[must_use]
    pub fn lat_max(&self) -> f64 {
        self.lat_max
    }

    #[must_use]
    pub fn lon_min(&self) -> f64 {
        self.lon_min
    }

    #[must_use]
    pub fn lon_max(&self) -> f64 {
        self.lon_max
    }

    /// Inclusive containment check on both axes
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}] x [{:.4}, {:.4}]",
            self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}

impl GridPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}
