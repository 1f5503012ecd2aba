//! Utility functions for coordinates and distances

use geo::{Coord, Point, Rect};

/// Earth's mean radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Build a renderable position from optional latitude and longitude.
///
/// Returns `None` unless both are present. The point follows the `geo`
/// convention of x = longitude, y = latitude.
#[inline(always)]
pub fn position(lat: Option<f64>, lon: Option<f64>) -> Option<Point<f64>> {
    Some(Point::new(lon?, lat?))
}

/// Calculate the Haversine distance between two positions in meters
#[inline]
pub fn haversine_distance(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let delta_lat = (p2.y() - p1.y()).to_radians();
    let delta_lon = (p2.x() - p1.x()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Sum of Haversine distances along consecutive positions
pub fn path_length(points: impl IntoIterator<Item = Point<f64>>) -> f64 {
    let mut total = 0.0;
    let mut prev: Option<Point<f64>> = None;
    for point in points {
        if let Some(prev) = prev {
            total += haversine_distance(prev, point);
        }
        prev = Some(point);
    }
    total
}

/// Smallest rectangle containing all positions, `None` when there are none
pub fn bounding_rect(points: impl IntoIterator<Item = Point<f64>>) -> Option<Rect<f64>> {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut found = false;

    for point in points {
        min_x = min_x.min(point.x());
        min_y = min_y.min(point.y());
        max_x = max_x.max(point.x());
        max_y = max_y.max(point.y());
        found = true;
    }

    found.then(|| {
        Rect::new(
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: max_y },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_requires_both_coordinates() {
        let point = position(Some(51.5), Some(-0.1)).unwrap();
        assert_eq!(point.y(), 51.5);
        assert_eq!(point.x(), -0.1);

        assert!(position(None, Some(-0.1)).is_none());
        assert!(position(Some(51.5), None).is_none());
    }

    #[test]
    fn test_haversine_distance() {
        // One degree of latitude is roughly 111 km
        let d = haversine_distance(Point::new(0.0, 0.0), Point::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 100.0);

        let same = haversine_distance(Point::new(11.0, 51.0), Point::new(11.0, 51.0));
        assert!(same.abs() < f64::EPSILON);
    }

    #[test]
    fn test_path_length() {
        assert_eq!(path_length(Vec::new()), 0.0);
        assert_eq!(path_length(vec![Point::new(0.0, 0.0)]), 0.0);

        let points = vec![
            Point::new(-0.1278, 51.5074),
            Point::new(-0.1276, 51.5076),
            Point::new(-0.1274, 51.5078),
        ];
        let length = path_length(points);
        assert!(length > 0.0);
        assert!(length < 1000.0);
    }

    #[test]
    fn test_bounding_rect() {
        assert!(bounding_rect(Vec::new()).is_none());

        let rect = bounding_rect(vec![Point::new(2.0, 1.0), Point::new(-1.0, 3.0)]).unwrap();
        assert_eq!(rect.min(), Coord { x: -1.0, y: 1.0 });
        assert_eq!(rect.max(), Coord { x: 2.0, y: 3.0 });
    }
}
