//! `RegionWeather` - Current weather for every city in a region
//!
//! This library discovers the distinct cities inside a bounding box by
//! reverse geocoding a sampling grid, then fetches one current weather
//! observation per city under a shared concurrency limit.

pub mod api;
pub mod collection;
pub mod config;
pub mod error;
pub mod limiter;
pub mod logging;
pub mod models;
pub mod output;

// Re-export core types for public API
pub use api::{OpenWeatherClient, WeatherService};
pub use collection::{
    CityRegistry, CityResolver, CollectionPipeline, CollectionResult, CollectionSummary,
    FetchOutcome, GridSampler, PointOutcome, RetryPolicy, WeatherFetcher,
};
pub use config::CollectorConfig;
pub use error::CollectorError;
pub use limiter::{RequestLimiter, RequestPermit};
pub use models::{BoundingBox, CandidateLocation, City, GridPoint, WeatherObservation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CollectorError>;
