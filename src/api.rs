//! Remote geocoding and weather service
//!
//! This module defines the [`WeatherService`] seam used by the collection
//! pipeline and its OpenWeather implementation on top of an async
//! `reqwest` client. Every call is a single HTTP exchange: retries and
//! concurrency limits are the caller's business.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::models::weather::openweather;
use crate::models::{CandidateLocation, City, GridPoint, WeatherObservation};
use crate::{CollectorError, Result};

const USER_AGENT: &str = concat!("region-weather/", env!("CARGO_PKG_VERSION"));

/// Remote service answering reverse geocoding and current weather queries
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Places near `point`, at most `limit` of them
    async fn reverse_geocode(&self, point: GridPoint, limit: u32)
        -> Result<Vec<CandidateLocation>>;

    /// Current weather at the city's coordinates, in metric units
    async fn current_weather(&self, city: &City) -> Result<WeatherObservation>;
}

/// OpenWeather API client
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    geocoding_url: String,
    weather_url: String,
}

impl OpenWeatherClient {
    /// Create a new client; fails with a configuration error when no API key is set
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CollectorError::config("Weather API key is missing"))?
            .to_string();

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CollectorError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            geocoding_url: config.geocoding_url.clone(),
            weather_url: config.weather_url.clone(),
        })
    }

    /// Perform one GET and decode the JSON body.
    ///
    /// The `appid` parameter is appended here so that it never shows up in logs.
    /// Transport errors are stripped of their URL for the same reason.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let start = Instant::now();
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                CollectorError::request(format!("Request to {url} failed: {}", e.without_url()))
            })?;

        let status = response.status();
        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            start.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            return Err(status_error(url, status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| {
                CollectorError::request(format!(
                    "Failed to read body from {url}: {}",
                    e.without_url()
                ))
            })?;

        if start.elapsed() > Duration::from_secs(5) {
            warn!(
                "Slow API response from {}: {:.3}s",
                url,
                start.elapsed().as_secs_f64()
            );
        }

        serde_json::from_str(&body)
            .map_err(|e| CollectorError::malformed(format!("Unexpected payload from {url}: {e}")))
    }
}

fn status_error(url: &str, status: StatusCode) -> CollectorError {
    match status {
        StatusCode::UNAUTHORIZED => {
            CollectorError::status(401, "Invalid API key. Please check your OpenWeather API key.")
        }
        StatusCode::TOO_MANY_REQUESTS => {
            CollectorError::status(429, format!("Rate limited by {url}"))
        }
        other => CollectorError::status(other.as_u16(), format!("{url} returned HTTP {other}")),
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    #[instrument(skip(self), fields(lat = point.lat, lon = point.lon))]
    async fn reverse_geocode(
        &self,
        point: GridPoint,
        limit: u32,
    ) -> Result<Vec<CandidateLocation>> {
        let params = [
            ("lat", point.lat.to_string()),
            ("lon", point.lon.to_string()),
            ("limit", limit.to_string()),
        ];
        let candidates: Vec<CandidateLocation> = self.get_json(&self.geocoding_url, &params).await?;

        debug!(
            "Reverse geocoding {} returned {:?}",
            point,
            candidates
                .iter()
                .map(|c| format!("{} ({:.4}, {:.4})", c.name, c.lat, c.lon))
                .collect::<Vec<_>>()
        );
        Ok(candidates)
    }

    #[instrument(skip(self, city), fields(city = %city.name))]
    async fn current_weather(&self, city: &City) -> Result<WeatherObservation> {
        let params = [
            ("lat", city.lat.to_string()),
            ("lon", city.lon.to_string()),
            ("units", "metric".to_string()),
        ];
        let payload: openweather::CurrentWeather = self.get_json(&self.weather_url, &params).await?;
        WeatherObservation::from_payload(city, payload)
    }
}
