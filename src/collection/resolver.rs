//! City resolution from grid points
//!
//! Each grid point is reverse geocoded once, under the shared request
//! limiter. In-bounds candidates are folded into a [`CityRegistry`]; the
//! first candidate seen for a key wins.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::api::WeatherService;
use crate::limiter::RequestLimiter;
use crate::models::{BoundingBox, CandidateLocation, City, GridPoint};
use crate::{CollectorError, Result};

/// Default number of candidates requested per grid point
pub const DEFAULT_GEOCODING_LIMIT: u32 = 5;

/// Deduplicating city set, safe to fill from concurrent resolutions
#[derive(Debug, Default)]
pub struct CityRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    keys: HashSet<String>,
    cities: Vec<City>,
}

impl CityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `city` unless a city with the same key is present.
    /// Returns `true` if the city was added.
    pub fn insert(&self, city: City) -> bool {
        let key = city.key();
        let mut inner = self.inner.lock();
        if !inner.keys.insert(key) {
            return false;
        }
        inner.cities.push(city);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cities in first-seen order
    #[must_use]
    pub fn into_cities(self) -> Vec<City> {
        self.inner.into_inner().cities
    }
}

/// What happened to a single grid point
#[derive(Debug)]
pub enum PointOutcome {
    Resolved {
        point: GridPoint,
        candidates: usize,
        out_of_bounds: usize,
        added: usize,
    },
    Failed {
        point: GridPoint,
        error: CollectorError,
    },
}

impl PointOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, PointOutcome::Failed { .. })
    }
}

/// Cities found for a bounding box plus the per-point outcomes
#[derive(Debug)]
pub struct Resolution {
    pub cities: Vec<City>,
    pub outcomes: Vec<PointOutcome>,
}

impl Resolution {
    #[must_use]
    pub fn failed_points(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

/// Turns grid points into a deduplicated set of cities inside the box
pub struct CityResolver<'a, S> {
    service: &'a S,
    limiter: &'a RequestLimiter,
    limit: u32,
}

impl<'a, S: WeatherService> CityResolver<'a, S> {
    #[must_use]
    pub fn new(service: &'a S, limiter: &'a RequestLimiter) -> Self {
        Self {
            service,
            limiter,
            limit: DEFAULT_GEOCODING_LIMIT,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Resolve every grid point concurrently and return the distinct cities.
    ///
    /// A failing point contributes nothing; it is reported in the outcomes.
    pub async fn resolve_cities(&self, bbox: &BoundingBox, points: &[GridPoint]) -> Resolution {
        let registry = CityRegistry::new();

        let outcomes = futures::future::join_all(
            points
                .iter()
                .map(|point| self.resolve_point(bbox, *point, &registry)),
        )
        .await;

        Resolution {
            cities: registry.into_cities(),
            outcomes,
        }
    }

    async fn resolve_point(
        &self,
        bbox: &BoundingBox,
        point: GridPoint,
        registry: &CityRegistry,
    ) -> PointOutcome {
        let candidates = match self.lookup(point).await {
            Ok(candidates) => candidates,
            Err(error) => return PointOutcome::Failed { point, error },
        };

        let total = candidates.len();
        let (inside, outside): (Vec<CandidateLocation>, Vec<CandidateLocation>) = candidates
            .into_iter()
            .partition(|c| bbox.contains(c.lat, c.lon));

        let added = inside
            .into_iter()
            .map(|candidate| registry.insert(City::from(candidate)))
            .filter(|&is_new| is_new)
            .count();

        PointOutcome::Resolved {
            point,
            candidates: total,
            out_of_bounds: outside.len(),
            added,
        }
    }

    async fn lookup(&self, point: GridPoint) -> Result<Vec<CandidateLocation>> {
        let _permit = self.limiter.acquire().await?;
        self.service.reverse_geocode(point, self.limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherObservation;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Answers reverse geocoding from a fixed table keyed by grid point
    struct TableGeocoder {
        answers: HashMap<String, Vec<CandidateLocation>>,
        fallback: Vec<CandidateLocation>,
        failing: Vec<GridPoint>,
    }

    impl TableGeocoder {
        fn always(candidates: Vec<CandidateLocation>) -> Self {
            Self {
                answers: HashMap::new(),
                fallback: candidates,
                failing: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl WeatherService for TableGeocoder {
        async fn reverse_geocode(
            &self,
            point: GridPoint,
            _limit: u32,
        ) -> Result<Vec<CandidateLocation>> {
            if self.failing.contains(&point) {
                return Err(CollectorError::status(500, "boom"));
            }
            Ok(self
                .answers
                .get(&point.to_string())
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()))
        }

        async fn current_weather(&self, _city: &City) -> Result<WeatherObservation> {
            Err(CollectorError::request("not used"))
        }
    }

    fn candidate(name: &str, lat: f64, lon: f64) -> CandidateLocation {
        CandidateLocation {
            name: name.to_string(),
            lat,
            lon,
            country: None,
            state: None,
        }
    }

    fn test_box() -> BoundingBox {
        BoundingBox::new(40.0, 40.1, -74.1, -74.0).unwrap()
    }

    fn corners() -> Vec<GridPoint> {
        vec![
            GridPoint::new(40.0, -74.1),
            GridPoint::new(40.0, -74.0),
            GridPoint::new(40.1, -74.1),
            GridPoint::new(40.1, -74.0),
        ]
    }

    #[test]
    fn test_registry_dedups_same_key() {
        let registry = CityRegistry::new();
        assert!(registry.insert(City::new("Jersey City", 40.05, -74.05)));
        assert!(!registry.insert(City::new("Jersey City", 40.05, -74.05)));
        assert!(!registry.insert(City::new("jersey city", 40.0501, -74.07)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_first_seen_wins() {
        let registry = CityRegistry::new();
        registry.insert(City::new("Bayonne", 40.067, -74.1));
        registry.insert(City::new("Bayonne", 40.0671, -74.05));
        registry.insert(City::new("Bayonne", 40.09, -74.05));

        let cities = registry.into_cities();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0].lon, -74.1);
        assert_eq!(cities[1].lat, 40.09);
    }

    #[tokio::test]
    async fn test_same_candidate_everywhere_yields_one_city() {
        let service = TableGeocoder::always(vec![candidate("Jersey City", 40.05, -74.05)]);
        let limiter = RequestLimiter::new(10);
        let resolver = CityResolver::new(&service, &limiter);

        let resolution = resolver.resolve_cities(&test_box(), &corners()).await;

        assert_eq!(resolution.cities.len(), 1);
        assert_eq!(resolution.cities[0].name, "Jersey City");
        assert_eq!(resolution.failed_points(), 0);
    }

    #[tokio::test]
    async fn test_out_of_bounds_candidates_are_dropped() {
        let service = TableGeocoder::always(vec![
            candidate("Jersey City", 40.05, -74.05),
            candidate("Manhattan", 40.78, -73.97),
            candidate("Edge Town", 40.1, -74.1),
        ]);
        let limiter = RequestLimiter::new(10);
        let resolver = CityResolver::new(&service, &limiter);

        let resolution = resolver.resolve_cities(&test_box(), &corners()).await;

        let names: Vec<&str> = resolution.cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(resolution.cities.len(), 2);
        assert!(names.contains(&"Jersey City"));
        assert!(names.contains(&"Edge Town"));
        assert!(!names.contains(&"Manhattan"));
    }

    #[tokio::test]
    async fn test_failed_point_does_not_abort() {
        let mut service = TableGeocoder::always(vec![]);
        service.failing = vec![GridPoint::new(40.0, -74.1)];
        service.answers.insert(
            GridPoint::new(40.1, -74.0).to_string(),
            vec![candidate("Hoboken", 40.07, -74.03)],
        );
        let limiter = RequestLimiter::new(10);
        let resolver = CityResolver::new(&service, &limiter);

        let resolution = resolver.resolve_cities(&test_box(), &corners()).await;

        assert_eq!(resolution.failed_points(), 1);
        assert_eq!(resolution.cities.len(), 1);
        assert_eq!(resolution.cities[0].name, "Hoboken");
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_outcome_counts() {
        let service = TableGeocoder::always(vec![
            candidate("Jersey City", 40.05, -74.05),
            candidate("Manhattan", 40.78, -73.97),
        ]);
        let limiter = RequestLimiter::new(10);
        let resolver = CityResolver::new(&service, &limiter);

        let resolution = resolver
            .resolve_cities(&test_box(), &[GridPoint::new(40.05, -74.05)])
            .await;

        match &resolution.outcomes[0] {
            PointOutcome::Resolved {
                candidates,
                out_of_bounds,
                added,
                ..
            } => {
                assert_eq!(*candidates, 2);
                assert_eq!(*out_of_bounds, 1);
                assert_eq!(*added, 1);
            }
            PointOutcome::Failed { error, .. } => panic!("unexpected failure: {error}"),
        }
    }
}
