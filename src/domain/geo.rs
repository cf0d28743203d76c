//! Great-circle distance and centroids on decimal-degree coordinates.

use {
    crate::config::EARTH_RADIUS_M,
    serde::{Deserialize, Serialize},
};

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Haversine distance in meters.
pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi_1 = a.lat.to_radians();
    let phi_2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi_1.cos() * phi_2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Unweighted mean of latitudes and longitudes.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Option<GeoPoint> {
    weighted_centroid(points.into_iter().map(|p| (p, 1.0)))
}

/// Weighted mean of latitudes and longitudes. None when empty or when the weights don't sum
/// to something positive.
pub fn weighted_centroid<'a>(
    points: impl IntoIterator<Item = (&'a GeoPoint, f64)>,
) -> Option<GeoPoint> {
    let (lat_sum, lon_sum, weight_sum) = points.into_iter().fold(
        (0.0, 0.0, 0.0),
        |(lat_acc, lon_acc, w_acc), (p, w)| (lat_acc + p.lat * w, lon_acc + p.lon * w, w_acc + w),
    );

    if weight_sum > 0.0 {
        Some(GeoPoint::new(lat_sum / weight_sum, lon_sum / weight_sum))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let p = GeoPoint::new(39.984, 116.318);
        assert_eq!(haversine_m(&p, &p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = haversine_m(&a, &b);
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn longitude_degrees_shrink_towards_the_poles() {
        let equator = haversine_m(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(0.0, 1.0));
        let north = haversine_m(&GeoPoint::new(60.0, 0.0), &GeoPoint::new(60.0, 1.0));
        assert!((north / equator - 0.5).abs() < 0.01);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(39.9, 116.3);
        let b = GeoPoint::new(40.1, 116.5);
        assert!((haversine_m(&a, &b) - haversine_m(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn centroids() {
        let pts = [GeoPoint::new(0.0, 0.0), GeoPoint::new(2.0, 4.0)];
        assert_eq!(centroid(&pts), Some(GeoPoint::new(1.0, 2.0)));

        let weighted = weighted_centroid([(&pts[0], 3.0), (&pts[1], 1.0)]).unwrap();
        assert!((weighted.lat - 0.5).abs() < 1e-12);
        assert!((weighted.lon - 1.0).abs() < 1e-12);

        let empty: [GeoPoint; 0] = [];
        assert_eq!(centroid(&empty), None);
        assert_eq!(weighted_centroid([(&pts[0], 0.0)]), None);
    }
}
