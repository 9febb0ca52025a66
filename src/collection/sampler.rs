//! Grid-based spatial sampling of a bounding box

use crate::models::{BoundingBox, GridPoint};

/// Default number of subdivisions per axis
pub const DEFAULT_DENSITY: u32 = 3;

/// Generates evenly spaced probe points covering a bounding box
pub struct GridSampler;

impl GridSampler {
    /// Produce the `(density + 1)^2` points of a uniform grid over `bbox`,
    /// row by row from the south-west corner.
    ///
    /// A zero-height or zero-width box yields repeated points.
    #[must_use]
    pub fn generate_grid(bbox: &BoundingBox, density: u32) -> Vec<GridPoint> {
        let density = density.max(1);
        let steps = f64::from(density);
        let lat_step = (bbox.lat_max() - bbox.lat_min()) / steps;
        let lon_step = (bbox.lon_max() - bbox.lon_min()) / steps;

        (0..=density)
            .flat_map(|i| {
                (0..=density).map(move |j| {
                    GridPoint::new(
                        edge_aware(bbox.lat_min(), bbox.lat_max(), i, density, lat_step),
                        edge_aware(bbox.lon_min(), bbox.lon_max(), j, density, lon_step),
                    )
                })
            })
            .collect()
    }
}

// min + density * step can overshoot max by an ulp; pin the last row/column.
fn edge_aware(min: f64, max: f64, index: u32, density: u32, step: f64) -> f64 {
    if index == density {
        max
    } else {
        min + f64::from(index) * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 4)]
    #[case(2, 9)]
    #[case(DEFAULT_DENSITY, 16)]
    #[case(7, 64)]
    fn test_point_count(#[case] density: u32, #[case] expected: usize) {
        let bbox = BoundingBox::new(40.0, 40.1, -74.1, -74.0).unwrap();
        assert_eq!(GridSampler::generate_grid(&bbox, density).len(), expected);
    }

    #[rstest]
    #[case(40.0, 40.1, -74.1, -74.0, 3)]
    #[case(-33.9, -33.7, 151.1, 151.3, 5)]
    #[case(0.1, 0.7, 0.1, 0.7, 9)]
    #[case(-90.0, 90.0, -180.0, 180.0, 4)]
    fn test_points_within_box(
        #[case] lat_min: f64,
        #[case] lat_max: f64,
        #[case] lon_min: f64,
        #[case] lon_max: f64,
        #[case] density: u32,
    ) {
        let bbox = BoundingBox::new(lat_min, lat_max, lon_min, lon_max).unwrap();
        let points = GridSampler::generate_grid(&bbox, density);
        assert_eq!(points.len(), ((density + 1) * (density + 1)) as usize);
        assert!(points.iter().all(|p| bbox.contains(p.lat, p.lon)));
    }

    #[test]
    fn test_corners_and_order() {
        let bbox = BoundingBox::new(40.0, 40.1, -74.1, -74.0).unwrap();
        let points = GridSampler::generate_grid(&bbox, 1);
        assert_eq!(
            points,
            vec![
                GridPoint::new(40.0, -74.1),
                GridPoint::new(40.0, -74.0),
                GridPoint::new(40.1, -74.1),
                GridPoint::new(40.1, -74.0),
            ]
        );
    }

    #[test]
    fn test_degenerate_box_repeats_points() {
        let bbox = BoundingBox::new(10.0, 10.0, 5.0, 5.0).unwrap();
        let points = GridSampler::generate_grid(&bbox, 2);
        assert_eq!(points.len(), 9);
        assert!(points.iter().all(|p| *p == GridPoint::new(10.0, 5.0)));
    }

    #[test]
    fn test_deterministic() {
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0).unwrap();
        assert_eq!(
            GridSampler::generate_grid(&bbox, 3),
            GridSampler::generate_grid(&bbox, 3)
        );
    }
}
