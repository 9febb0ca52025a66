//! Weather fan-out with per-city retry
//!
//! One weather request per city, all started together and bounded by the
//! shared request limiter. A city's slot is held across its retries and the
//! backoff sleeps between them.

use std::time::Duration;

use crate::api::WeatherService;
use crate::config::CollectionConfig;
use crate::limiter::RequestLimiter;
use crate::models::{City, WeatherObservation};
use crate::CollectorError;

/// Default attempts per city, first try included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default pause between attempts
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Fixed-interval retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Pause between two failed attempts; no jitter, no growth
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl From<&CollectionConfig> for RetryPolicy {
    fn from(config: &CollectionConfig) -> Self {
        Self::new(config.max_attempts, config.retry_backoff())
    }
}

/// What happened to a single city
#[derive(Debug)]
pub enum FetchOutcome {
    Observed {
        observation: WeatherObservation,
        attempts: u32,
    },
    Failed {
        city: City,
        attempts: u32,
        error: CollectorError,
    },
}

impl FetchOutcome {
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            FetchOutcome::Observed { attempts, .. } | FetchOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    #[must_use]
    pub fn into_observation(self) -> Option<WeatherObservation> {
        match self {
            FetchOutcome::Observed { observation, .. } => Some(observation),
            FetchOutcome::Failed { .. } => None,
        }
    }
}

/// Fetches current weather for a set of cities
pub struct WeatherFetcher<'a, S> {
    service: &'a S,
    limiter: &'a RequestLimiter,
    retry: RetryPolicy,
}

impl<'a, S: WeatherService> WeatherFetcher<'a, S> {
    #[must_use]
    pub fn new(service: &'a S, limiter: &'a RequestLimiter) -> Self {
        Self {
            service,
            limiter,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch every city concurrently and wait for all of them.
    ///
    /// Outcomes come back in the order of `cities`.
    pub async fn fetch_all(&self, cities: &[City]) -> Vec<FetchOutcome> {
        futures::future::join_all(cities.iter().map(|city| self.fetch_city(city))).await
    }

    async fn fetch_city(&self, city: &City) -> FetchOutcome {
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(error) => {
                return FetchOutcome::Failed {
                    city: city.clone(),
                    attempts: 0,
                    error,
                };
            }
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.service.current_weather(city).await {
                Ok(observation) => {
                    return FetchOutcome::Observed {
                        observation,
                        attempts: attempt,
                    };
                }
                Err(error) if attempt >= self.retry.max_attempts => {
                    return FetchOutcome::Failed {
                        city: city.clone(),
                        attempts: attempt,
                        error,
                    };
                }
                Err(error) => {
                    tracing::debug!(
                        "Weather attempt {}/{} for {} failed: {}",
                        attempt,
                        self.retry.max_attempts,
                        city.name,
                        error
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                }
            }
        }
    }
}
