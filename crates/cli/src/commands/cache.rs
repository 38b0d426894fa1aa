use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tripmemo_core::config::OrganizerConfig;
use tripmemo_core::geocode::cache::GeocodeCache;

use crate::store::Store;

pub fn show(store: &Store) -> Result<()> {
    let entries = store.load_geocode_cache()?;
    if entries.is_empty() {
        println!("Geocode cache is empty.");
        return Ok(());
    }

    let mut rows: Vec<_> = entries.iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Bucket"), Cell::new("City"), Cell::new("Country")]);
    for (bucket, place) in rows {
        table.add_row(vec![Cell::new(bucket), Cell::new(&place.city), Cell::new(&place.country)]);
    }
    println!("{table}");
    println!("{} cached places", entries.len());
    Ok(())
}

pub fn export(store: &Store, path: &Path) -> Result<()> {
    let entries = store.load_geocode_cache()?;
    let count = entries.len();
    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("Exported {count} cached places to {}", path.display());
    Ok(())
}

/// Merge a JSON cache file into the stored cache. Imported entries win.
pub fn import(store: &mut Store, config: &OrganizerConfig, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let imported = GeocodeCache::from_json(&json, config.geocode.cache_precision)?;
    let count = imported.len();

    let mut entries: HashMap<_, _> = store.load_geocode_cache()?;
    entries.extend(imported.into_entries());
    store.save_geocode_cache(&entries)?;
    println!("Imported {count} places ({} cached in total)", entries.len());
    Ok(())
}

pub fn clear(store: &Store) -> Result<()> {
    let removed = store.clear_geocode_cache()?;
    println!("Removed {removed} cached places.");
    Ok(())
}
