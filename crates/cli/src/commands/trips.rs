use anyhow::{anyhow, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use tripmemo_core::domain::{Trip, TripCategory};

use super::short_id;
use crate::store::Store;

pub fn list(store: &Store, favorites_only: bool) -> Result<()> {
    let trips: Vec<Trip> = store
        .list_trips()?
        .into_iter()
        .filter(|t| !favorites_only || t.is_favorite)
        .collect();

    if trips.is_empty() {
        println!("No trips found. Run `tripmemo organize --photos <file>` first.");
        return Ok(());
    }

    println!("{}", trips_table(&trips));
    if let Some(at) = store.last_organized()? {
        println!("Last organized {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

pub(crate) fn trips_table(trips: &[Trip]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new(""),
        Cell::new("Title"),
        Cell::new("Dates"),
        Cell::new("Days"),
        Cell::new("Photos"),
        Cell::new("Category"),
    ]);

    for trip in trips {
        let title = if trip.is_unresolved() {
            Cell::new(trip.display_title()).fg(Color::Yellow)
        } else {
            Cell::new(trip.display_title())
        };
        table.add_row(vec![
            Cell::new(short_id(&trip.id)),
            Cell::new(if trip.is_favorite { "★" } else { "" }),
            title,
            Cell::new(trip.formatted_date_range()),
            Cell::new(trip.duration_days()),
            Cell::new(trip.photo_count()),
            Cell::new(trip.category),
        ]);
    }
    table
}

pub fn show(store: &Store, id: &str) -> Result<()> {
    let trip = store.find_trip(id)?;
    print!("{}", detail(&trip));
    Ok(())
}

pub(crate) fn detail(trip: &Trip) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", trip.display_title()));
    out.push_str(&format!("{}\n", "-".repeat(60)));
    out.push_str(&format!("  ID:        {}\n", trip.id));
    if trip.custom_title.is_some() {
        out.push_str(&format!("  Generated: {}\n", trip.title));
    }
    out.push_str(&format!("  Location:  {}\n", trip.location_name));
    if let Some(c) = trip.centroid {
        out.push_str(&format!("  Center:    {:.4}, {:.4}\n", c.latitude, c.longitude));
    }
    out.push_str(&format!(
        "  Dates:     {} ({} days)\n",
        trip.formatted_date_range(),
        trip.duration_days()
    ));
    out.push_str(&format!("  Category:  {}\n", trip.category));
    out.push_str(&format!("  Favorite:  {}\n", if trip.is_favorite { "yes" } else { "no" }));
    if let Some(notes) = &trip.notes {
        out.push_str(&format!("  Notes:     {notes}\n"));
    }
    out.push_str(&format!("  Photos:    {}\n", trip.photo_count()));
    for photo_id in &trip.photo_ids {
        let cover = if trip.cover_photo_id.as_deref() == Some(photo_id.as_str()) {
            " (cover)"
        } else {
            ""
        };
        out.push_str(&format!("    {photo_id}{cover}\n"));
    }
    out
}

pub fn favorite(store: &Store, id: &str) -> Result<()> {
    let mut trip = store.find_trip(id)?;
    trip.toggle_favorite();
    store.update_trip(&trip)?;
    let state = if trip.is_favorite { "added to" } else { "removed from" };
    println!("{} {state} favorites", trip.display_title());
    Ok(())
}

pub fn rename(store: &Store, id: &str, title: &str) -> Result<()> {
    let mut trip = store.find_trip(id)?;
    trip.set_custom_title(title);
    store.update_trip(&trip)?;
    println!("Trip is now titled: {}", trip.display_title());
    Ok(())
}

pub fn category(store: &Store, id: &str, label: &str) -> Result<()> {
    let category = TripCategory::from_label(label).ok_or_else(|| {
        let known: Vec<&str> = TripCategory::ALL.iter().map(|c| c.label()).collect();
        anyhow!("unknown category `{label}` (expected one of: {})", known.join(", "))
    })?;
    let mut trip = store.find_trip(id)?;
    trip.category = category;
    store.update_trip(&trip)?;
    println!("{} is now a {} trip", trip.display_title(), category);
    Ok(())
}

pub fn notes(store: &Store, id: &str, text: Option<String>) -> Result<()> {
    let mut trip = store.find_trip(id)?;
    trip.notes = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    store.update_trip(&trip)?;
    match trip.notes {
        Some(_) => println!("Notes saved for {}", trip.display_title()),
        None => println!("Notes cleared for {}", trip.display_title()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tripmemo_core::domain::{Coordinate, UNKNOWN_LOCATION};
    use uuid::Uuid;

    fn make_trip(location: &str) -> Trip {
        let start = Utc.with_ymd_and_hms(2024, 7, 3, 9, 0, 0).unwrap();
        Trip {
            id: Uuid::new_v4(),
            title: format!("July 2024 • {location}"),
            custom_title: None,
            start_date: start,
            end_date: start + Duration::days(6),
            location_name: location.to_string(),
            centroid: Some(Coordinate::new(41.9028, 12.4964)),
            photo_ids: vec!["p1".into(), "p2".into()],
            cover_photo_id: Some("p1".into()),
            is_favorite: false,
            category: TripCategory::Vacation,
            notes: None,
        }
    }

    fn stored(trip: &Trip) -> Store {
        let mut store = Store::open_in_memory().unwrap();
        store.replace_trips(std::slice::from_ref(trip)).unwrap();
        store
    }

    #[test]
    fn test_detail() {
        let mut trip = make_trip("Rome");
        trip.set_custom_title("Roman holiday");
        trip.notes = Some("Gelato every day".into());
        let out = detail(&trip);
        assert!(out.starts_with("Roman holiday\n"));
        assert!(out.contains("Generated: July 2024 • Rome"));
        assert!(out.contains("Center:    41.9028, 12.4964"));
        assert!(out.contains("Jul 3, 2024 - Jul 9, 2024 (6 days)"));
        assert!(out.contains("Notes:     Gelato every day"));
        assert!(out.contains("p1 (cover)"));
        assert!(!out.contains("p2 (cover)"));
    }

    #[test]
    fn test_table_has_row_per_trip() {
        let trips = vec![make_trip("Rome"), make_trip(UNKNOWN_LOCATION)];
        let rendered = trips_table(&trips).to_string();
        assert!(rendered.contains("July 2024 • Rome"));
        assert!(rendered.contains(UNKNOWN_LOCATION));
        assert!(rendered.contains(&short_id(&trips[1].id)));
    }

    #[test]
    fn test_favorite_toggles() {
        let trip = make_trip("Rome");
        let store = stored(&trip);
        let id = short_id(&trip.id);
        favorite(&store, &id).unwrap();
        assert!(store.find_trip(&id).unwrap().is_favorite);
        favorite(&store, &id).unwrap();
        assert!(!store.find_trip(&id).unwrap().is_favorite);
    }

    #[test]
    fn test_rename_and_restore() {
        let trip = make_trip("Rome");
        let store = stored(&trip);
        let id = short_id(&trip.id);
        rename(&store, &id, "  Honeymoon ").unwrap();
        assert_eq!(store.find_trip(&id).unwrap().display_title(), "Honeymoon");
        rename(&store, &id, "").unwrap();
        assert_eq!(store.find_trip(&id).unwrap().display_title(), "July 2024 • Rome");
    }

    #[test]
    fn test_category_by_label() {
        let trip = make_trip("Rome");
        let store = stored(&trip);
        let id = short_id(&trip.id);
        category(&store, &id, "family").unwrap();
        assert_eq!(store.find_trip(&id).unwrap().category, TripCategory::Family);
        assert!(category(&store, &id, "honeymoon").is_err());
    }

    #[test]
    fn test_notes_set_and_clear() {
        let trip = make_trip("Rome");
        let store = stored(&trip);
        let id = short_id(&trip.id);
        notes(&store, &id, Some("Trevi at dawn".into())).unwrap();
        assert_eq!(store.find_trip(&id).unwrap().notes.as_deref(), Some("Trevi at dawn"));
        notes(&store, &id, None).unwrap();
        assert!(store.find_trip(&id).unwrap().notes.is_none());
    }
}
