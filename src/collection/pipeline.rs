//! Collection pipeline
//!
//! Sampler, resolver and fetcher run strictly one after the other; inside
//! the resolver and fetcher stages work fans out under one shared
//! [`RequestLimiter`]. Per-unit failures are logged here and dropped.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::api::{OpenWeatherClient, WeatherService};
use crate::collection::fetcher::{FetchOutcome, RetryPolicy, WeatherFetcher};
use crate::collection::resolver::{CityResolver, DEFAULT_GEOCODING_LIMIT, PointOutcome};
use crate::collection::sampler::{DEFAULT_DENSITY, GridSampler};
use crate::config::{CollectionConfig, CollectorConfig};
use crate::limiter::RequestLimiter;
use crate::models::{BoundingBox, WeatherObservation};
use crate::{CollectorError, Result};

/// Default shared cap on in-flight requests
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10;

/// Counters describing one collection run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub grid_points: usize,
    pub failed_points: usize,
    pub cities_found: usize,
    pub observations: usize,
    pub failed_cities: usize,
    /// Most requests that held a limiter slot at the same time
    pub peak_concurrent_requests: usize,
}

/// Observations for every city that succeeded, plus run counters
#[derive(Debug, Clone, Default)]
pub struct CollectionResult {
    pub observations: Vec<WeatherObservation>,
    pub summary: CollectionSummary,
}

impl CollectionResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Orchestrates grid sampling, city resolution and weather fetching
pub struct CollectionPipeline<S> {
    service: S,
    limiter: RequestLimiter,
    density: u32,
    geocoding_limit: u32,
    retry: RetryPolicy,
}

impl CollectionPipeline<OpenWeatherClient> {
    /// Build a pipeline talking to OpenWeather as configured
    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        let client = OpenWeatherClient::new(&config.api)?;
        Ok(Self::new(client, &config.collection))
    }
}

impl<S: WeatherService> CollectionPipeline<S> {
    #[must_use]
    pub fn new(service: S, settings: &CollectionConfig) -> Self {
        Self {
            service,
            limiter: RequestLimiter::new(settings.max_concurrent_requests),
            density: settings.grid_density,
            geocoding_limit: settings.geocoding_limit,
            retry: RetryPolicy::from(settings),
        }
    }

    /// Pipeline with the stock density, limit, concurrency cap and retry policy
    #[must_use]
    pub fn with_defaults(service: S) -> Self {
        Self {
            service,
            limiter: RequestLimiter::new(DEFAULT_MAX_CONCURRENT_REQUESTS),
            density: DEFAULT_DENSITY,
            geocoding_limit: DEFAULT_GEOCODING_LIMIT,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_density(mut self, density: u32) -> Self {
        self.density = density;
        self
    }

    #[must_use]
    pub fn limiter(&self) -> &RequestLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Collect current weather for every city found inside `bbox`.
    ///
    /// Returns whatever succeeded. Fails only when no geocoding request
    /// went through at all. The reported peak covers this run only.
    #[instrument(skip(self, bbox), fields(bbox = %bbox, density = self.density))]
    pub async fn collect(&self, bbox: &BoundingBox) -> Result<CollectionResult> {
        self.limiter.reset_peak();
        let points = GridSampler::generate_grid(bbox, self.density);
        info!(
            "Searching for cities at {} grid points ({} concurrent requests max)",
            points.len(),
            self.limiter.capacity()
        );

        let resolution = CityResolver::new(&self.service, &self.limiter)
            .with_limit(self.geocoding_limit)
            .resolve_cities(bbox, &points)
            .await;

        for outcome in &resolution.outcomes {
            if let PointOutcome::Failed { point, error } = outcome {
                warn!("Error finding cities at {}: {}", point, error);
            }
        }

        let mut summary = CollectionSummary {
            grid_points: points.len(),
            failed_points: resolution.failed_points(),
            cities_found: resolution.cities.len(),
            ..CollectionSummary::default()
        };

        if !points.is_empty() && summary.failed_points == summary.grid_points {
            return Err(CollectorError::unavailable(format!(
                "All {} geocoding requests failed",
                summary.grid_points
            )));
        }

        if resolution.cities.is_empty() {
            info!("No cities found in the specified region");
            summary.peak_concurrent_requests = self.limiter.peak();
            return Ok(CollectionResult {
                observations: Vec::new(),
                summary,
            });
        }

        info!(
            "Found {} cities. Collecting weather data...",
            resolution.cities.len()
        );

        let outcomes = WeatherFetcher::new(&self.service, &self.limiter)
            .with_retry(self.retry)
            .fetch_all(&resolution.cities)
            .await;

        let mut observations = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Observed { observation, .. } => observations.push(observation),
                FetchOutcome::Failed {
                    city,
                    attempts,
                    error,
                } => {
                    summary.failed_cities += 1;
                    warn!(
                        "Failed to get weather for {} after {} attempts: {}",
                        city.name, attempts, error
                    );
                }
            }
        }

        summary.observations = observations.len();
        summary.peak_concurrent_requests = self.limiter.peak();
        info!(
            "Successfully collected data for {} cities",
            observations.len()
        );

        Ok(CollectionResult {
            observations,
            summary,
        })
    }
}
