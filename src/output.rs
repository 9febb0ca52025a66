//! JSON output artifact and console summary

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Result;
use crate::models::WeatherObservation;

/// One row of the saved weather file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub city: String,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub humidity: u8,
    pub weather: String,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&WeatherObservation> for ObservationRecord {
    fn from(observation: &WeatherObservation) -> Self {
        Self {
            city: observation.city_name.clone(),
            coordinates: Coordinates {
                latitude: observation.lat,
                longitude: observation.lon,
            },
            temperature: observation.temperature_c,
            humidity: observation.humidity_pct,
            weather: observation.description.clone(),
            wind_speed: observation.wind_speed,
        }
    }
}

/// `weather_data_YYYYmmdd_HHMMSS.json` for the current local time
#[must_use]
pub fn output_file_name() -> String {
    format!("weather_data_{}.json", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Write `observations` as pretty JSON into `dir`.
///
/// Nothing is written for an empty result.
pub fn save_results(dir: &Path, observations: &[WeatherObservation]) -> Result<Option<PathBuf>> {
    if observations.is_empty() {
        return Ok(None);
    }

    let records: Vec<ObservationRecord> =
        observations.iter().map(ObservationRecord::from).collect();
    let json = serde_json::to_string_pretty(&records)?;

    fs::create_dir_all(dir)?;
    let path = dir.join(output_file_name());
    fs::write(&path, json)?;

    info!("Results saved to {}", path.display());
    Ok(Some(path))
}

/// Human-readable summary of the collected observations
#[must_use]
pub fn format_summary(observations: &[WeatherObservation]) -> String {
    let mut out = String::from("Weather Data Summary:\n");
    for observation in observations {
        let _ = write!(
            out,
            "\nCity: {}\nTemperature: {}\nWeather: {}\n",
            observation.city_name,
            observation.format_temperature(),
            observation.description
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn observation(name: &str) -> WeatherObservation {
        WeatherObservation {
            city_name: name.to_string(),
            lat: 40.05,
            lon: -74.05,
            temperature_c: 18.4,
            humidity_pct: 64,
            description: "broken clouds".to_string(),
            wind_speed: 3.6,
        }
    }

    #[test]
    fn test_record_field_names() {
        let record = ObservationRecord::from(&observation("Jersey City"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "city": "Jersey City",
                "coordinates": {"latitude": 40.05, "longitude": -74.05},
                "temperature": 18.4,
                "humidity": 64,
                "weather": "broken clouds",
                "wind_speed": 3.6
            })
        );
        // integer percent, not 64.0
        assert!(value["humidity"].is_u64());
    }

    #[test]
    fn test_save_results_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let observations = vec![observation("Jersey City"), observation("Hoboken")];

        let path = save_results(dir.path(), &observations).unwrap().unwrap();

        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("weather_data_"));
        assert!(file_name.ends_with(".json"));
        // weather_data_ + YYYYmmdd_HHMMSS + .json
        assert_eq!(file_name.len(), "weather_data_".len() + 15 + ".json".len());

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let rows = written.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["city"], "Hoboken");
        assert_eq!(rows[0]["coordinates"]["longitude"], -74.05);
    }

    #[test]
    fn test_empty_results_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_results(dir.path(), &[]).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_format_summary() {
        let summary = format_summary(&[observation("Jersey City")]);
        assert!(summary.contains("City: Jersey City"));
        assert!(summary.contains("Temperature: 18.4°C"));
        assert!(summary.contains("Weather: broken clouds"));
    }
}
