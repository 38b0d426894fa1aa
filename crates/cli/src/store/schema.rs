use rusqlite::Connection;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: u32 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS trips (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            custom_title    TEXT,
            start_date      TEXT NOT NULL,
            end_date        TEXT NOT NULL,
            location_name   TEXT NOT NULL,
            centroid_lat    REAL,
            centroid_lon    REAL,
            cover_photo_id  TEXT,
            is_favorite     INTEGER NOT NULL DEFAULT 0,
            category        TEXT NOT NULL,
            notes           TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_trips_start ON trips(start_date);

        CREATE TABLE IF NOT EXISTS trip_photos (
            trip_id     TEXT NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
            photo_id    TEXT NOT NULL,
            position    INTEGER NOT NULL,
            PRIMARY KEY (trip_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_trip_photos_photo ON trip_photos(photo_id);

        CREATE TABLE IF NOT EXISTS geocode_cache (
            bucket      TEXT PRIMARY KEY,
            city        TEXT NOT NULL,
            country     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS config (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Stamp an unversioned database and refuse one written by a newer build.
pub fn migrate(conn: &Connection) -> Result<()> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM config WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .ok();

    let db = match stored {
        Some(v) => v.parse::<u32>().unwrap_or(0),
        None => 0,
    };
    if db > SCHEMA_VERSION {
        return Err(Error::SchemaTooNew {
            db,
            code: SCHEMA_VERSION,
        });
    }
    if db < SCHEMA_VERSION {
        conn.execute(
            "INSERT INTO config (key, value) VALUES ('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [SCHEMA_VERSION.to_string()],
        )?;
    }
    Ok(())
}
