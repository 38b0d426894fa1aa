use std::path::Path;

use anyhow::{Context, Result};
use tripmemo_core::domain::Trip;

use crate::store::Store;

pub fn export(store: &Store, path: &Path) -> Result<()> {
    let trips = store.list_trips()?;
    let json = serde_json::to_string_pretty(&trips)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("Exported {} trips to {}", trips.len(), path.display());
    Ok(())
}

/// Replace the stored trips with the ones in a previously exported file.
pub fn import(store: &mut Store, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut trips: Vec<Trip> =
        serde_json::from_str(&json).with_context(|| format!("parsing trips {}", path.display()))?;
    trips.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    store.replace_trips(&trips)?;
    println!("Imported {} trips", trips.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tripmemo_core::domain::TripCategory;
    use uuid::Uuid;

    #[test]
    fn test_export_then_import() {
        let start = Utc.with_ymd_and_hms(2023, 12, 30, 10, 0, 0).unwrap();
        let trip = Trip {
            id: Uuid::new_v4(),
            title: "December 2023 • Vienna".into(),
            custom_title: None,
            start_date: start,
            end_date: start,
            location_name: "Vienna".into(),
            centroid: None,
            photo_ids: vec!["a".into()],
            cover_photo_id: Some("a".into()),
            is_favorite: true,
            category: TripCategory::Weekend,
            notes: None,
        };
        let mut store = Store::open_in_memory().unwrap();
        store.replace_trips(std::slice::from_ref(&trip)).unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("trips.json");
        export(&store, &out).unwrap();

        let read: Vec<Trip> = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(read, vec![trip.clone()]);

        let mut fresh = Store::open_in_memory().unwrap();
        import(&mut fresh, &out).unwrap();
        assert_eq!(fresh.list_trips().unwrap(), vec![trip]);
    }

    #[test]
    fn test_import_rejects_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("trips.json");
        std::fs::write(&path, "[{\"id\": \"nope\"}]").unwrap();
        let mut store = Store::open_in_memory().unwrap();
        assert!(import(&mut store, &path).is_err());
    }
}
