use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to a trip whose place could not be resolved.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A photo record as supplied by the photo library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub taken_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<Coordinate>,
}

impl Photo {
    pub fn new(id: impl Into<String>, taken_at: DateTime<Utc>, location: Option<Coordinate>) -> Self {
        Self {
            id: id.into(),
            taken_at,
            location,
        }
    }

    /// The photo's location, if present and well-formed.
    pub fn valid_location(&self) -> Option<Coordinate> {
        self.location.filter(Coordinate::is_valid)
    }
}

/// The user's residence, used to exclude local photos from trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    pub coordinate: Coordinate,
    #[serde(default)]
    pub country: Option<String>,
}

impl HomeLocation {
    pub fn new(coordinate: Coordinate, country: Option<String>) -> Self {
        Self {
            coordinate,
            country,
        }
    }
}

/// Trip categories for organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TripCategory {
    Vacation,
    Business,
    Weekend,
    Adventure,
    Family,
    Friends,
    Solo,
    Other,
}

impl TripCategory {
    pub const ALL: [TripCategory; 8] = [
        TripCategory::Vacation,
        TripCategory::Business,
        TripCategory::Weekend,
        TripCategory::Adventure,
        TripCategory::Family,
        TripCategory::Friends,
        TripCategory::Solo,
        TripCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TripCategory::Vacation => "Vacation",
            TripCategory::Business => "Business",
            TripCategory::Weekend => "Weekend",
            TripCategory::Adventure => "Adventure",
            TripCategory::Family => "Family",
            TripCategory::Friends => "Friends",
            TripCategory::Solo => "Solo",
            TripCategory::Other => "Other",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for TripCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A finished trip. Owns a copy of its member photo IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub custom_title: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location_name: String,
    pub centroid: Option<Coordinate>,
    pub photo_ids: Vec<String>,
    pub cover_photo_id: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub category: TripCategory,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Trip {
    /// The user's custom title when set, otherwise the generated one.
    pub fn display_title(&self) -> &str {
        self.custom_title.as_deref().unwrap_or(&self.title)
    }

    pub fn photo_count(&self) -> usize {
        self.photo_ids.len()
    }

    /// Whole days between start and end, never less than one.
    pub fn duration_days(&self) -> i64 {
        duration_days(self.start_date, self.end_date)
    }

    pub fn is_unresolved(&self) -> bool {
        self.location_name == UNKNOWN_LOCATION
    }

    pub fn year(&self) -> i32 {
        self.start_date.year()
    }

    /// "Jul 3, 2024" for a same-day trip, "Jul 3, 2024 - Jul 9, 2024" otherwise.
    pub fn formatted_date_range(&self) -> String {
        let start = self.start_date.format("%b %-d, %Y").to_string();
        if self.start_date.date_naive() == self.end_date.date_naive() {
            start
        } else {
            format!("{} - {}", start, self.end_date.format("%b %-d, %Y"))
        }
    }

    pub fn toggle_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
    }

    /// Set a custom title. An empty or whitespace-only title clears it.
    pub fn set_custom_title(&mut self, title: &str) {
        let trimmed = title.trim();
        self.custom_title = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
}

pub fn duration_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_days().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_trip(start: DateTime<Utc>, end: DateTime<Utc>) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            title: "July 2024 • Italy".to_string(),
            custom_title: None,
            start_date: start,
            end_date: end,
            location_name: "Italy".to_string(),
            centroid: Some(Coordinate::new(41.9, 12.5)),
            photo_ids: vec!["a".into(), "b".into()],
            cover_photo_id: Some("a".into()),
            is_favorite: false,
            category: TripCategory::Vacation,
            notes: None,
        }
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(51.5, -0.12).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_photo_valid_location_filters_malformed() {
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let good = Photo::new("a", at, Some(Coordinate::new(10.0, 10.0)));
        let bad = Photo::new("b", at, Some(Coordinate::new(f64::INFINITY, 10.0)));
        let none = Photo::new("c", at, None);
        assert!(good.valid_location().is_some());
        assert!(bad.valid_location().is_none());
        assert!(none.valid_location().is_none());
    }

    #[test]
    fn test_duration_days_never_below_one() {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();
        assert_eq!(make_trip(start, start).duration_days(), 1);
        let end = Utc.with_ymd_and_hms(2024, 7, 1, 21, 0, 0).unwrap();
        assert_eq!(make_trip(start, end).duration_days(), 1);
        let end = Utc.with_ymd_and_hms(2024, 7, 8, 10, 0, 0).unwrap();
        assert_eq!(make_trip(start, end).duration_days(), 7);
    }

    #[test]
    fn test_display_title_prefers_custom() {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();
        let mut trip = make_trip(start, start);
        assert_eq!(trip.display_title(), "July 2024 • Italy");
        trip.set_custom_title("  Honeymoon ");
        assert_eq!(trip.display_title(), "Honeymoon");
        trip.set_custom_title("   ");
        assert_eq!(trip.custom_title, None);
    }

    #[test]
    fn test_formatted_date_range() {
        let start = Utc.with_ymd_and_hms(2024, 7, 3, 9, 0, 0).unwrap();
        let same_day = Utc.with_ymd_and_hms(2024, 7, 3, 18, 0, 0).unwrap();
        assert_eq!(make_trip(start, same_day).formatted_date_range(), "Jul 3, 2024");
        let end = Utc.with_ymd_and_hms(2024, 7, 9, 18, 0, 0).unwrap();
        assert_eq!(
            make_trip(start, end).formatted_date_range(),
            "Jul 3, 2024 - Jul 9, 2024"
        );
    }

    #[test]
    fn test_category_labels_roundtrip() {
        for category in TripCategory::ALL {
            assert_eq!(TripCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(TripCategory::from_label("business"), Some(TripCategory::Business));
        assert_eq!(TripCategory::from_label("cruise"), None);
    }

    #[test]
    fn test_trip_json_shape() {
        let start = Utc.with_ymd_and_hms(2024, 7, 3, 9, 0, 0).unwrap();
        let trip = make_trip(start, start);
        let json = serde_json::to_value(&trip).unwrap();
        assert_eq!(json["category"], "Vacation");
        assert_eq!(json["photo_ids"].as_array().unwrap().len(), 2);
        let back: Trip = serde_json::from_value(json).unwrap();
        assert_eq!(back, trip);
    }
}
