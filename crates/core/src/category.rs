use crate::domain::TripCategory;

/// Location-name keywords that decide the category outright, checked in order.
const KEYWORDS: &[(&str, TripCategory)] = &[
    ("conference", TripCategory::Business),
    ("business", TripCategory::Business),
    ("mountain", TripCategory::Adventure),
    ("hiking", TripCategory::Adventure),
    ("adventure", TripCategory::Adventure),
];

/// Trips this short (in days) are weekends.
pub const WEEKEND_MAX_DAYS: i64 = 3;

/// Assign a category from the location name and trip length.
///
/// A keyword in the lowercased name wins. Otherwise trips of up to three days
/// are weekends and everything longer is a vacation; the 4-6 day band has no
/// category of its own and also lands on vacation.
pub fn classify(location_name: &str, duration_days: i64) -> TripCategory {
    let lowercased = location_name.to_lowercase();
    if let Some((_, category)) = KEYWORDS.iter().find(|(kw, _)| lowercased.contains(kw)) {
        return *category;
    }

    if duration_days <= WEEKEND_MAX_DAYS {
        TripCategory::Weekend
    } else {
        TripCategory::Vacation
    }
}
