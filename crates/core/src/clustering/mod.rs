pub mod merge;

use tracing::debug;

use crate::config::ClusterConfig;
use crate::domain::{Coordinate, Photo};
use crate::geo::haversine_distance;

pub use merge::merge_clusters;

/// A time-ordered run of photos considered to belong to one trip.
pub type PhotoCluster = Vec<Photo>;

/// Partition photos into candidate trip clusters.
///
/// Photos without a valid location are discarded, as are photos within
/// `min_trip_distance_m` of `home` (when a home is given). The rest are sorted
/// by time and split greedily: a photo joins the current cluster when both its
/// time gap and its distance to the *last* photo of that cluster are within
/// the configured thresholds. Clusters below `min_photos_per_cluster` are
/// dropped, never folded into a neighbor.
pub fn build_clusters(
    photos: &[Photo],
    home: Option<&Coordinate>,
    config: &ClusterConfig,
) -> Vec<PhotoCluster> {
    let mut candidates: Vec<&Photo> = photos
        .iter()
        .filter(|photo| match (photo.valid_location(), home) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(location), Some(home)) => {
                haversine_distance(&location, home) >= config.min_trip_distance_m
            }
        })
        .collect();

    debug!(
        total = photos.len(),
        candidates = candidates.len(),
        "filtered photos for clustering"
    );

    candidates.sort_by_key(|photo| photo.taken_at);

    let max_gap = config.max_day_gap();
    let mut clusters: Vec<PhotoCluster> = Vec::new();
    let mut current: PhotoCluster = Vec::new();

    for photo in candidates {
        let joins = current
            .last()
            .is_some_and(|last| continues_cluster(last, photo, max_gap, config.grouping_radius_m));

        if !joins && !current.is_empty() {
            close_cluster(&mut clusters, std::mem::take(&mut current), config);
        }
        current.push(photo.clone());
    }
    close_cluster(&mut clusters, current, config);

    clusters
}

fn continues_cluster(
    last: &Photo,
    photo: &Photo,
    max_gap: chrono::Duration,
    radius_m: f64,
) -> bool {
    let (Some(from), Some(to)) = (last.valid_location(), photo.valid_location()) else {
        return false;
    };
    photo.taken_at - last.taken_at <= max_gap && haversine_distance(&from, &to) <= radius_m
}

fn close_cluster(clusters: &mut Vec<PhotoCluster>, cluster: PhotoCluster, config: &ClusterConfig) {
    if cluster.is_empty() {
        return;
    }
    if cluster.len() >= config.min_photos_per_cluster {
        clusters.push(cluster);
    } else {
        debug!(size = cluster.len(), "dropping undersized cluster");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    const HOME: Coordinate = Coordinate {
        latitude: 52.52,
        longitude: 13.405,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn make_photo(id: &str, hours: i64, lat: f64, lon: f64) -> Photo {
        Photo::new(id, t0() + Duration::hours(hours), Some(Coordinate::new(lat, lon)))
    }

    fn ids(cluster: &PhotoCluster) -> Vec<&str> {
        cluster.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_close_photos_form_one_cluster() {
        // Rome, ~1200 km from Berlin
        let photos = vec![
            make_photo("a", 0, 41.90, 12.49),
            make_photo("b", 1, 41.91, 12.50),
            make_photo("c", 2, 41.89, 12.48),
        ];
        let clusters = build_clusters(&photos, Some(&HOME), &ClusterConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(&clusters[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_home_photos_excluded() {
        let photos = vec![
            make_photo("home1", 0, 52.52, 13.40),
            make_photo("home2", 1, 52.53, 13.41),
            make_photo("away1", 2, 41.90, 12.49),
            make_photo("away2", 3, 41.91, 12.50),
        ];
        let config = ClusterConfig::default();
        let clusters = build_clusters(&photos, Some(&HOME), &config);
        assert_eq!(clusters.len(), 1);
        for photo in &clusters[0] {
            let location = photo.valid_location().unwrap();
            assert!(haversine_distance(&location, &HOME) >= config.min_trip_distance_m);
        }
    }

    #[test]
    fn test_no_home_keeps_all_geolocated() {
        let photos = vec![
            make_photo("a", 0, 52.52, 13.40),
            make_photo("b", 1, 52.53, 13.41),
        ];
        let clusters = build_clusters(&photos, None, &ClusterConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
    }

    #[test]
    fn test_missing_and_malformed_locations_dropped() {
        let mut photos = vec![
            make_photo("a", 0, 41.90, 12.49),
            Photo::new("nogps", t0() + Duration::hours(1), None),
            Photo::new(
                "bad",
                t0() + Duration::hours(2),
                Some(Coordinate::new(200.0, 0.0)),
            ),
            make_photo("b", 3, 41.91, 12.50),
        ];
        photos.reverse();
        let clusters = build_clusters(&photos, Some(&HOME), &ClusterConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(&clusters[0]), vec!["a", "b"]);
    }

    #[test]
    fn test_day_gap_splits_cluster() {
        let photos = vec![
            make_photo("a", 0, 41.90, 12.49),
            make_photo("b", 1, 41.90, 12.49),
            make_photo("c", 24 * 10, 41.90, 12.49),
            make_photo("d", 24 * 10 + 1, 41.90, 12.49),
        ];
        let clusters = build_clusters(&photos, Some(&HOME), &ClusterConfig::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(ids(&clusters[0]), vec!["a", "b"]);
        assert_eq!(ids(&clusters[1]), vec!["c", "d"]);
    }

    #[test]
    fn test_gap_exactly_at_threshold_continues() {
        let config = ClusterConfig::default();
        let photos = vec![
            make_photo("a", 0, 41.90, 12.49),
            make_photo("b", 24 * 4, 41.90, 12.49),
        ];
        let clusters = build_clusters(&photos, Some(&HOME), &config);
        assert_eq!(clusters.len(), 1);

        let photos = vec![
            make_photo("a", 0, 41.90, 12.49),
            Photo::new(
                "b",
                t0() + Duration::hours(24 * 4) + Duration::seconds(1),
                Some(Coordinate::new(41.90, 12.49)),
            ),
        ];
        assert!(build_clusters(&photos, Some(&HOME), &config).is_empty());
    }

    #[test]
    fn test_distance_measured_from_last_photo() {
        // Each hop is ~111 km (1 degree latitude), under the 150 km radius,
        // although the first and last photos are ~333 km apart.
        let photos = vec![
            make_photo("a", 0, 40.0, 12.0),
            make_photo("b", 1, 41.0, 12.0),
            make_photo("c", 2, 42.0, 12.0),
            make_photo("d", 3, 43.0, 12.0),
        ];
        let clusters = build_clusters(&photos, Some(&HOME), &ClusterConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 4);
    }

    #[test]
    fn test_distance_jump_splits_cluster() {
        let photos = vec![
            make_photo("rome1", 0, 41.90, 12.49),
            make_photo("rome2", 1, 41.90, 12.49),
            make_photo("madrid1", 2, 40.42, -3.70),
            make_photo("madrid2", 3, 40.42, -3.70),
        ];
        let clusters = build_clusters(&photos, Some(&HOME), &ClusterConfig::default());
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_undersized_clusters_dropped_not_merged() {
        let photos = vec![
            make_photo("a", 0, 41.90, 12.49),
            make_photo("lonely", 24 * 10, 41.90, 12.49),
            make_photo("c", 24 * 20, 41.90, 12.49),
            make_photo("d", 24 * 20 + 1, 41.90, 12.49),
        ];
        let clusters = build_clusters(&photos, Some(&HOME), &ClusterConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(ids(&clusters[0]), vec!["c", "d"]);
    }

    #[test]
    fn test_min_photos_one_keeps_singletons() {
        let config = ClusterConfig {
            min_photos_per_cluster: 1,
            ..Default::default()
        };
        let photos = vec![
            make_photo("a", 0, 41.90, 12.49),
            make_photo("b", 24 * 10, 41.90, 12.49),
        ];
        assert_eq!(build_clusters(&photos, Some(&HOME), &config).len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_clusters(&[], Some(&HOME), &ClusterConfig::default()).is_empty());
    }
}
