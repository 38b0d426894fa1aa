pub mod schema;

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tripmemo_core::domain::{Coordinate, HomeLocation, Trip, TripCategory};
use tripmemo_core::geocode::cache::CachedPlace;
use uuid::Uuid;

use crate::error::{Error, Result};

const TRIP_COLUMNS: &str = "id, title, custom_title, start_date, end_date, location_name, \
     centroid_lat, centroid_lon, cover_photo_id, is_favorite, category, notes";

const HOME_LAT: &str = "home_lat";
const HOME_LON: &str = "home_lon";
const HOME_COUNTRY: &str = "home_country";
const LAST_ORGANIZED: &str = "last_organized";

/// SQLite-backed persistence for trips, the geocode cache and settings.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::initialize(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::initialize(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    // ── Trips ────────────────────────────────────────────────────────

    /// Replace every stored trip with `trips` in one transaction.
    pub fn replace_trips(&mut self, trips: &[Trip]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM trip_photos", [])?;
        tx.execute("DELETE FROM trips", [])?;
        {
            let mut insert_trip = tx.prepare(&format!(
                "INSERT INTO trips ({TRIP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ))?;
            let mut insert_photo =
                tx.prepare("INSERT INTO trip_photos (trip_id, photo_id, position) VALUES (?1, ?2, ?3)")?;

            for trip in trips {
                let id = trip.id.to_string();
                insert_trip.execute(params![
                    id,
                    trip.title,
                    trip.custom_title,
                    format_date(&trip.start_date),
                    format_date(&trip.end_date),
                    trip.location_name,
                    trip.centroid.map(|c| c.latitude),
                    trip.centroid.map(|c| c.longitude),
                    trip.cover_photo_id,
                    trip.is_favorite,
                    trip.category.label(),
                    trip.notes,
                ])?;
                for (position, photo_id) in trip.photo_ids.iter().enumerate() {
                    insert_photo.execute(params![id, photo_id, position as i64])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// All trips, newest first.
    pub fn list_trips(&self) -> Result<Vec<Trip>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips ORDER BY start_date DESC, id"
        ))?;
        let mut trips = stmt
            .query_map([], row_to_trip)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for trip in &mut trips {
            trip.photo_ids = self.photo_ids(&trip.id)?;
        }
        Ok(trips)
    }

    /// Look a trip up by full id or unique id prefix.
    pub fn find_trip(&self, id_prefix: &str) -> Result<Trip> {
        let prefix = id_prefix.trim().to_lowercase();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE id LIKE ?1 || '%' LIMIT 2"
        ))?;
        let mut matches = stmt
            .query_map(params![prefix], row_to_trip)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        match matches.len() {
            0 => Err(Error::TripNotFound(id_prefix.to_string())),
            1 => {
                let mut trip = matches.remove(0);
                trip.photo_ids = self.photo_ids(&trip.id)?;
                Ok(trip)
            }
            _ => Err(Error::AmbiguousTripId(id_prefix.to_string())),
        }
    }

    /// Write back the editable fields of a trip. Photo membership is untouched.
    pub fn update_trip(&self, trip: &Trip) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE trips SET title = ?2, custom_title = ?3, location_name = ?4,
                 is_favorite = ?5, category = ?6, notes = ?7
             WHERE id = ?1",
            params![
                trip.id.to_string(),
                trip.title,
                trip.custom_title,
                trip.location_name,
                trip.is_favorite,
                trip.category.label(),
                trip.notes,
            ],
        )?;
        if changed == 0 {
            return Err(Error::TripNotFound(trip.id.to_string()));
        }
        Ok(())
    }

    pub fn trip_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn photo_ids(&self, trip_id: &Uuid) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT photo_id FROM trip_photos WHERE trip_id = ?1 ORDER BY position")?;
        let ids = stmt
            .query_map(params![trip_id.to_string()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    // ── Geocode cache ────────────────────────────────────────────────

    pub fn load_geocode_cache(&self) -> Result<HashMap<String, CachedPlace>> {
        let mut stmt = self.conn.prepare("SELECT bucket, city, country FROM geocode_cache")?;
        let entries = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, CachedPlace::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?)))
            })?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(entries)
    }

    /// Replace the persisted cache with `entries`.
    pub fn save_geocode_cache(&mut self, entries: &HashMap<String, CachedPlace>) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM geocode_cache", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO geocode_cache (bucket, city, country) VALUES (?1, ?2, ?3)")?;
            for (bucket, place) in entries {
                stmt.execute(params![bucket, place.city, place.country])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn clear_geocode_cache(&self) -> Result<usize> {
        let count = self.conn.execute("DELETE FROM geocode_cache", [])?;
        Ok(count)
    }

    // ── Home ─────────────────────────────────────────────────────────

    pub fn home(&self) -> Result<Option<HomeLocation>> {
        let lat = self.get_config(HOME_LAT)?.and_then(|v| v.parse::<f64>().ok());
        let lon = self.get_config(HOME_LON)?.and_then(|v| v.parse::<f64>().ok());
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Ok(None);
        };
        Ok(Some(HomeLocation::new(
            Coordinate::new(lat, lon),
            self.get_config(HOME_COUNTRY)?,
        )))
    }

    pub fn set_home(&mut self, home: &HomeLocation) -> Result<()> {
        let tx = self.conn.transaction()?;
        for (key, value) in [
            (HOME_LAT, Some(home.coordinate.latitude.to_string())),
            (HOME_LON, Some(home.coordinate.longitude.to_string())),
            (HOME_COUNTRY, home.country.clone()),
        ] {
            match value {
                Some(value) => {
                    tx.execute(
                        "INSERT INTO config (key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                        params![key, value],
                    )?;
                }
                None => {
                    tx.execute("DELETE FROM config WHERE key = ?1", params![key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn clear_home(&self) -> Result<()> {
        for key in [HOME_LAT, HOME_LON, HOME_COUNTRY] {
            self.delete_config(key)?;
        }
        Ok(())
    }

    pub fn last_organized(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .get_config(LAST_ORGANIZED)?
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|d| d.with_timezone(&Utc)))
    }

    pub fn set_last_organized(&self, at: DateTime<Utc>) -> Result<()> {
        self.set_config(LAST_ORGANIZED, &format_date(&at))
    }

    // ── Config ───────────────────────────────────────────────────────

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn delete_config(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM config WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_date(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad date `{raw}`: {e}")))
}

/// Map a `TRIP_COLUMNS` row. Photo ids are loaded separately.
fn row_to_trip(row: &Row) -> rusqlite::Result<Trip> {
    let raw_id: String = row.get(0)?;
    let id = Uuid::parse_str(&raw_id).map_err(|e| conversion_error(0, format!("bad trip id `{raw_id}`: {e}")))?;

    let lat: Option<f64> = row.get(6)?;
    let lon: Option<f64> = row.get(7)?;
    let centroid = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        _ => None,
    };

    let raw_category: String = row.get(10)?;
    let category = TripCategory::from_label(&raw_category)
        .ok_or_else(|| conversion_error(10, format!("unknown category `{raw_category}`")))?;

    Ok(Trip {
        id,
        title: row.get(1)?,
        custom_title: row.get(2)?,
        start_date: parse_date(row, 3)?,
        end_date: parse_date(row, 4)?,
        location_name: row.get(5)?,
        centroid,
        photo_ids: Vec::new(),
        cover_photo_id: row.get(8)?,
        is_favorite: row.get(9)?,
        category,
        notes: row.get(11)?,
    })
}
