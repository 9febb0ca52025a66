//! Current weather observation model

use serde::{Deserialize, Serialize};

use crate::models::City;
use crate::{CollectorError, Result};

/// Current weather for one resolved city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherObservation {
    /// Name of the city this observation was requested for
    pub city_name: String,
    /// Latitude reported by the weather service
    pub lat: f64,
    /// Longitude reported by the weather service
    pub lon: f64,
    /// Temperature in Celsius
    pub temperature_c: f64,
    /// Relative humidity in percent
    pub humidity_pct: u8,
    /// Human-readable description of weather conditions
    pub description: String,
    /// Wind speed in m/s
    pub wind_speed: f64,
}

impl WeatherObservation {
    /// Build an observation from a current weather payload, tagged with the city name
    pub fn from_payload(city: &City, payload: openweather::CurrentWeather) -> Result<Self> {
        let description = payload
            .weather
            .into_iter()
            .next()
            .map(|condition| condition.description)
            .ok_or_else(|| {
                CollectorError::malformed(format!(
                    "Weather payload for {} has no weather conditions",
                    city.name
                ))
            })?;

        Ok(Self {
            city_name: city.name.clone(),
            lat: payload.coord.lat,
            lon: payload.coord.lon,
            temperature_c: payload.main.temp,
            humidity_pct: payload.main.humidity,
            description,
            wind_speed: payload.wind.speed,
        })
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature_c)
    }
}

/// OpenWeather current weather payload (`units=metric`)
pub mod openweather {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct CurrentWeather {
        pub coord: Coord,
        pub main: Main,
        pub weather: Vec<Condition>,
        pub wind: Wind,
    }

    #[derive(Debug, Deserialize)]
    pub struct Coord {
        pub lat: f64,
        pub lon: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct Main {
        pub temp: f64,
        pub humidity: u8,
    }

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub description: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Wind {
        pub speed: f64,
    }
}
