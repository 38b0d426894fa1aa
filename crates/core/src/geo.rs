//! Geographic helpers: great-circle distance and photo centroids.

use crate::domain::{Coordinate, Photo};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters (haversine formula).
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Arithmetic mean of the valid photo locations.
///
/// Returns `None` when no photo carries a valid location. Not meridian-aware:
/// a cluster straddling ±180° longitude averages to somewhere near 0°.
pub fn centroid<'a, I>(photos: I) -> Option<Coordinate>
where
    I: IntoIterator<Item = &'a Photo>,
{
    let mut total_lat = 0.0;
    let mut total_lon = 0.0;
    let mut count = 0usize;

    for location in photos.into_iter().filter_map(Photo::valid_location) {
        total_lat += location.latitude;
        total_lon += location.longitude;
        count += 1;
    }

    if count == 0 {
        return None;
    }
    Some(Coordinate::new(
        total_lat / count as f64,
        total_lon / count as f64,
    ))
}
