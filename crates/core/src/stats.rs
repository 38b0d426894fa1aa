use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::domain::Trip;

/// Summary numbers over a trip collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripStats {
    pub total_trips: usize,
    pub total_photos: usize,
    pub total_days: i64,
    pub unique_locations: usize,
    /// (year, trip count), newest year first.
    pub trips_by_year: Vec<(i32, usize)>,
    /// (location, trip count), most visited first.
    pub top_destinations: Vec<(String, usize)>,
}

impl TripStats {
    pub fn compute(trips: &[Trip], top_n: usize) -> Self {
        let mut by_year: BTreeMap<i32, usize> = BTreeMap::new();
        let mut by_location: HashMap<&str, usize> = HashMap::new();
        let mut locations: HashSet<&str> = HashSet::new();

        for trip in trips {
            *by_year.entry(trip.year()).or_default() += 1;
            *by_location.entry(trip.location_name.as_str()).or_default() += 1;
            locations.insert(trip.location_name.as_str());
        }

        let mut top_destinations: Vec<(String, usize)> = by_location
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        top_destinations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_destinations.truncate(top_n);

        Self {
            total_trips: trips.len(),
            total_photos: trips.iter().map(Trip::photo_count).sum(),
            total_days: trips.iter().map(Trip::duration_days).sum(),
            unique_locations: locations.len(),
            trips_by_year: by_year.into_iter().rev().collect(),
            top_destinations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TripCategory;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn make_trip(location: &str, year: i32, days: i64, photos: usize) -> Trip {
        let start = Utc.with_ymd_and_hms(year, 5, 1, 9, 0, 0).unwrap();
        Trip {
            id: Uuid::new_v4(),
            title: format!("May {year} • {location}"),
            custom_title: None,
            start_date: start,
            end_date: start + Duration::days(days),
            location_name: location.to_string(),
            centroid: None,
            photo_ids: (0..photos).map(|i| format!("p{i}")).collect(),
            cover_photo_id: Some("p0".into()),
            is_favorite: false,
            category: TripCategory::Vacation,
            notes: None,
        }
    }

    #[test]
    fn test_empty() {
        let stats = TripStats::compute(&[], 5);
        assert_eq!(stats.total_trips, 0);
        assert_eq!(stats.total_days, 0);
        assert!(stats.trips_by_year.is_empty());
        assert!(stats.top_destinations.is_empty());
    }

    #[test]
    fn test_totals_and_rankings() {
        let trips = vec![
            make_trip("Italy", 2023, 7, 10),
            make_trip("Italy", 2024, 3, 5),
            make_trip("Spain", 2024, 0, 2),
            make_trip("Austin, USA", 2022, 2, 1),
        ];
        let stats = TripStats::compute(&trips, 2);
        assert_eq!(stats.total_trips, 4);
        assert_eq!(stats.total_photos, 18);
        // 7 + 3 + 1 (same-day counts as one) + 2
        assert_eq!(stats.total_days, 13);
        assert_eq!(stats.unique_locations, 3);
        assert_eq!(stats.trips_by_year, vec![(2024, 2), (2023, 1), (2022, 1)]);
        assert_eq!(
            stats.top_destinations,
            vec![("Italy".to_string(), 2), ("Austin, USA".to_string(), 1)]
        );
    }
}
