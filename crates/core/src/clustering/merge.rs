use tracing::debug;

use super::PhotoCluster;
use crate::config::MergeConfig;
use crate::geo::{centroid, haversine_distance};

/// Coalesce clusters that the sequential pass split apart.
///
/// Each unmerged cluster, in input order, becomes an anchor and absorbs every
/// later unmerged cluster whose centroid lies within `merge_radius_m` of the
/// anchor group's current centroid and which starts within
/// `max_merge_day_gap_days` of the anchor group's latest photo. One pass only:
/// two clusters related only through a third that was absorbed by a
/// different anchor stay separate. Output groups are sorted by time.
pub fn merge_clusters(clusters: Vec<PhotoCluster>, config: &MergeConfig) -> Vec<PhotoCluster> {
    let max_gap = config.max_merge_day_gap();
    let input_count = clusters.len();
    let mut pending: Vec<Option<PhotoCluster>> = clusters.into_iter().map(Some).collect();
    let mut merged: Vec<PhotoCluster> = Vec::new();

    for i in 0..pending.len() {
        let Some(mut group) = pending[i].take() else {
            continue;
        };

        for slot in pending.iter_mut().skip(i + 1) {
            let Some(candidate) = slot.as_ref() else {
                continue;
            };
            if should_merge(&group, candidate, config.merge_radius_m, max_gap) {
                if let Some(absorbed) = slot.take() {
                    group.extend(absorbed);
                }
            }
        }

        group.sort_by_key(|photo| photo.taken_at);
        merged.push(group);
    }

    debug!(
        before = input_count,
        after = merged.len(),
        "merged nearby clusters"
    );
    merged
}

fn should_merge(
    group: &PhotoCluster,
    candidate: &PhotoCluster,
    radius_m: f64,
    max_gap: chrono::Duration,
) -> bool {
    let (Some(a), Some(b)) = (centroid(group), centroid(candidate)) else {
        return false;
    };
    if haversine_distance(&a, &b) > radius_m {
        return false;
    }

    let group_end = group.iter().map(|p| p.taken_at).max();
    let candidate_start = candidate.iter().map(|p| p.taken_at).min();
    match (group_end, candidate_start) {
        (Some(end), Some(start)) => {
            let gap = if start >= end { start - end } else { end - start };
            gap <= max_gap
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, Photo};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashSet;

    fn make_cluster(prefix: &str, start_day: i64, lat: f64, lon: f64) -> PhotoCluster {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        (0..2)
            .map(|i| {
                Photo::new(
                    format!("{prefix}{i}"),
                    t0 + Duration::days(start_day) + Duration::hours(i),
                    Some(Coordinate::new(lat, lon)),
                )
            })
            .collect()
    }

    fn all_ids(clusters: &[PhotoCluster]) -> Vec<String> {
        let mut ids: Vec<String> = clusters.iter().flatten().map(|p| p.id.clone()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_nearby_clusters_within_gap_merge() {
        // ~80 km apart, 5 days apart
        let clusters = vec![
            make_cluster("a", 0, 41.90, 12.49),
            make_cluster("b", 5, 42.62, 12.49),
        ];
        let merged = merge_clusters(clusters, &MergeConfig::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].len(), 4);
        assert!(merged[0].windows(2).all(|w| w[0].taken_at <= w[1].taken_at));
    }

    #[test]
    fn test_far_clusters_stay_separate() {
        let clusters = vec![
            make_cluster("rome", 0, 41.90, 12.49),
            make_cluster("madrid", 2, 40.42, -3.70),
        ];
        assert_eq!(merge_clusters(clusters, &MergeConfig::default()).len(), 2);
    }

    #[test]
    fn test_time_gap_beyond_window_stays_separate() {
        let clusters = vec![
            make_cluster("a", 0, 41.90, 12.49),
            make_cluster("b", 90, 41.90, 12.49),
        ];
        assert_eq!(merge_clusters(clusters, &MergeConfig::default()).len(), 2);
    }

    #[test]
    fn test_anchor_absorbs_non_adjacent_cluster() {
        // Rome, Madrid excursion, Rome again
        let clusters = vec![
            make_cluster("rome1", 0, 41.90, 12.49),
            make_cluster("madrid", 2, 40.42, -3.70),
            make_cluster("rome2", 4, 41.91, 12.50),
        ];
        let merged = merge_clusters(clusters, &MergeConfig::default());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].len(), 4);
        assert!(merged[0].iter().all(|p| p.id.starts_with("rome")));
        assert_eq!(merged[1][0].id, "madrid0");
    }

    #[test]
    fn test_single_pass_is_not_transitive_closure() {
        let config = MergeConfig {
            merge_radius_m: 120_000.0,
            max_merge_day_gap_days: 30.0,
        };
        // b is 111 km from a; c is 111 km from b but 222 km from a.
        // a absorbs b (new centroid ~55 km north of a), then c is ~166 km away.
        let clusters = vec![
            make_cluster("a", 0, 40.0, 12.0),
            make_cluster("b", 1, 41.0, 12.0),
            make_cluster("c", 2, 42.0, 12.0),
        ];
        let merged = merge_clusters(clusters, &config);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].len(), 4);
        assert_eq!(merged[1][0].id, "c0");
    }

    #[test]
    fn test_merge_preserves_every_photo_once() {
        let clusters = vec![
            make_cluster("a", 0, 41.90, 12.49),
            make_cluster("b", 3, 40.42, -3.70),
            make_cluster("c", 6, 41.95, 12.52),
            make_cluster("d", 8, 40.40, -3.72),
        ];
        let before = all_ids(&clusters);
        let merged = merge_clusters(clusters, &MergeConfig::default());
        let after = all_ids(&merged);
        assert_eq!(before, after);
        let unique: HashSet<&String> = after.iter().collect();
        assert_eq!(unique.len(), after.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_clusters(Vec::new(), &MergeConfig::default()).is_empty());
    }
}
