//! Data models for the region weather collector
//!
//! This module contains the core domain models organized by concern:
//! - Region: bounding boxes and grid sample points
//! - City: raw geocoding candidates and deduplicated cities
//! - Weather: current weather observations and the service payload

pub mod city;
pub mod region;
pub mod weather;

// Re-export all public types for convenient access
pub use city::{CandidateLocation, City};
pub use region::{BoundingBox, GridPoint};
pub use weather::WeatherObservation;
