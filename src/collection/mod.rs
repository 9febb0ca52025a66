//! Collection module
//!
//! This module implements the bounded-concurrency collection pipeline:
//! - Grid sampling of the bounding box
//! - Reverse geocoding of grid points into a deduplicated city set
//! - Retrying weather fetches for every city
//! - Orchestration of the three stages and result aggregation

pub mod fetcher;
pub mod pipeline;
pub mod resolver;
pub mod sampler;

// Re-export commonly used types from submodules
pub use fetcher::{FetchOutcome, RetryPolicy, WeatherFetcher};
pub use pipeline::{CollectionPipeline, CollectionResult, CollectionSummary};
pub use resolver::{CityRegistry, CityResolver, PointOutcome, Resolution};
pub use sampler::{DEFAULT_DENSITY, GridSampler};
