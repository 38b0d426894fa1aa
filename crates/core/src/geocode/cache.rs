use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::Coordinate;
use crate::error::{Error, Result};

/// A resolved place as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPlace {
    pub city: String,
    pub country: String,
}

impl CachedPlace {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }
}

/// Quantize a coordinate into a `"lat,lon"` bucket key.
///
/// At the default precision of 2 decimals a bucket is roughly 1.1 km wide.
pub fn bucket_key(coordinate: &Coordinate, precision: u32) -> String {
    let factor = 10f64.powi(precision as i32);
    // Adding 0.0 folds -0.0 into 0.0 so both sides of the equator share a key.
    let lat = (coordinate.latitude * factor).round() / factor + 0.0;
    let lon = (coordinate.longitude * factor).round() / factor + 0.0;
    let p = precision as usize;
    format!("{lat:.p$},{lon:.p$}")
}

/// Bucket → place map. Never evicts on its own; the caller persists it.
#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    entries: HashMap<String, CachedPlace>,
    precision: u32,
}

impl GeocodeCache {
    pub fn new(precision: u32) -> Self {
        Self {
            entries: HashMap::new(),
            precision,
        }
    }

    /// Start from a previously persisted map.
    pub fn with_entries(entries: HashMap<String, CachedPlace>, precision: u32) -> Self {
        Self {
            entries,
            precision,
        }
    }

    pub fn from_json(json: &str, precision: u32) -> Result<Self> {
        let entries: HashMap<String, CachedPlace> =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(Self::with_entries(entries, precision))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.entries).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn key_for(&self, coordinate: &Coordinate) -> String {
        bucket_key(coordinate, self.precision)
    }

    pub fn get(&self, coordinate: &Coordinate) -> Option<&CachedPlace> {
        self.entries.get(&self.key_for(coordinate))
    }

    pub fn insert(&mut self, coordinate: &Coordinate, place: CachedPlace) {
        let key = self.key_for(coordinate);
        self.entries.insert(key, place);
    }

    /// Invalidate one bucket.
    pub fn remove(&mut self, coordinate: &Coordinate) -> Option<CachedPlace> {
        let key = self.key_for(coordinate);
        self.entries.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn entries(&self) -> &HashMap<String, CachedPlace> {
        &self.entries
    }

    pub fn into_entries(self) -> HashMap<String, CachedPlace> {
        self.entries
    }
}
