use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use region_weather::{
    BoundingBox, CollectionPipeline, CollectorConfig, CollectorError, logging, output,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<CollectorError>() {
                Some(collector_err) => eprintln!("Error: {}", collector_err.user_message()),
                None => eprintln!("Error: {err:#}"),
            }
            tracing::debug!("{:?}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = CollectorConfig::load()?;
    logging::init(&config.logging);

    println!("\nWeather Data Collection System");
    let bbox = read_bounding_box(&mut io::stdin().lock())?;

    let pipeline = CollectionPipeline::from_config(&config)?;
    println!("Searching for cities...");
    let result = pipeline.collect(&bbox).await?;

    let summary = &result.summary;
    println!(
        "Found {} cities, collected weather for {} ({} grid points, {} failed)",
        summary.cities_found, summary.observations, summary.grid_points, summary.failed_points
    );

    if result.is_empty() {
        println!("No weather data collected for the specified region.");
        return Ok(());
    }

    println!("\n{}", output::format_summary(&result.observations));

    let dir = Path::new(&config.output.directory);
    if let Some(path) = output::save_results(dir, &result.observations)
        .with_context(|| format!("Failed to save results to {}", dir.display()))?
    {
        println!("Results saved to {}", path.display());
    }

    Ok(())
}

fn read_bounding_box(input: &mut impl BufRead) -> Result<BoundingBox> {
    let lat_min = prompt_coordinate(input, "Minimum latitude: ")?;
    let lat_max = prompt_coordinate(input, "Maximum latitude: ")?;
    let lon_min = prompt_coordinate(input, "Minimum longitude: ")?;
    let lon_max = prompt_coordinate(input, "Maximum longitude: ")?;
    Ok(BoundingBox::new(lat_min, lat_max, lon_min, lon_max)?)
}

fn prompt_coordinate(input: &mut impl BufRead, prompt: &str) -> Result<f64> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let value = line.trim().parse::<f64>().map_err(|_| {
        CollectorError::validation(format!(
            "'{}' is not a number. Please enter valid numbers for coordinates.",
            line.trim()
        ))
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_bounding_box() {
        let mut input = Cursor::new("40.0\n40.1\n-74.1\n-74.0\n");
        let bbox = read_bounding_box(&mut input).unwrap();
        assert_eq!(bbox.lat_min(), 40.0);
        assert_eq!(bbox.lon_max(), -74.0);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut input = Cursor::new("41.0\n40.0\n-74.1\n-74.0\n");
        let err = read_bounding_box(&mut input).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CollectorError>(),
            Some(CollectorError::Validation { .. })
        ));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let mut input = Cursor::new("north\n");
        let err = read_bounding_box(&mut input).unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }
}
