//! Tunables for clustering, merging and geocoding.
//!
//! Every section deserializes with `#[serde(default)]`, so a partial JSON
//! document only overrides the fields it names.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// Thresholds for the sequential clustering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Photos closer than this to home (meters) are never trip material.
    pub min_trip_distance_m: f64,
    /// Max distance (meters) from the previous photo to stay in the same cluster.
    pub grouping_radius_m: f64,
    /// Max time gap (days) from the previous photo to stay in the same cluster.
    pub max_day_gap_days: f64,
    /// Clusters smaller than this are dropped.
    pub min_photos_per_cluster: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_trip_distance_m: 30_000.0,
            grouping_radius_m: 150_000.0,
            max_day_gap_days: 4.0,
            min_photos_per_cluster: 2,
        }
    }
}

impl ClusterConfig {
    pub fn max_day_gap(&self) -> chrono::Duration {
        days_to_duration(self.max_day_gap_days)
    }
}

/// Thresholds for recombining over-split clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Max centroid-to-centroid distance (meters).
    pub merge_radius_m: f64,
    /// Max gap (days) between the end of the running group and the next cluster's start.
    pub max_merge_day_gap_days: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            merge_radius_m: 200_000.0,
            max_merge_day_gap_days: 30.0,
        }
    }
}

impl MergeConfig {
    pub fn max_merge_day_gap(&self) -> chrono::Duration {
        days_to_duration(self.max_merge_day_gap_days)
    }
}

/// Delay growth between geocoding attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// The same delay between every attempt.
    Fixed,
    /// The delay doubles after every failed attempt.
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    pub request_timeout_ms: u64,
    /// Attempts per lookup; provider throttling does not use one up.
    pub max_attempts: u32,
    /// Throttling replies tolerated per lookup before giving up.
    pub max_throttle_waits: u32,
    pub retry_delay_ms: u64,
    pub backoff: Backoff,
    /// Requests allowed per rolling window.
    pub rate_limit_quota: u32,
    pub rate_limit_window_ms: u64,
    /// Decimal places kept in cache bucket keys.
    pub cache_precision: u32,
    /// Countries shown as "City, CODE" when abroad.
    pub disambiguate_countries: Vec<String>,
    /// Cities always shown as "City, CODE" when abroad.
    pub well_known_cities: Vec<String>,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            max_attempts: 3,
            max_throttle_waits: 5,
            retry_delay_ms: 1_000,
            backoff: Backoff::Fixed,
            rate_limit_quota: 45,
            rate_limit_window_ms: 60_000,
            cache_precision: 2,
            disambiguate_countries: ["United States", "United Kingdom", "Australia"]
                .into_iter()
                .map(String::from)
                .collect(),
            well_known_cities: [
                "New York",
                "Los Angeles",
                "London",
                "Manchester",
                "Edinburgh",
                "Sydney",
                "Melbourne",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl GeocodeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let base = Duration::from_millis(self.retry_delay_ms);
        match self.backoff {
            Backoff::Fixed => base,
            Backoff::Exponential => base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1))),
        }
    }
}

/// What to do when no home location is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoHomePolicy {
    /// Skip the home filter and cluster every geolocated photo.
    #[default]
    UseAllPhotos,
    /// Produce no trips at all.
    NoTrips,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub clustering: ClusterConfig,
    pub merge: MergeConfig,
    pub geocode: GeocodeConfig,
    pub no_home_policy: NoHomePolicy,
}

impl OrganizerConfig {
    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.clustering;
        let m = &self.merge;
        let g = &self.geocode;

        let checks = [
            (c.min_trip_distance_m >= 0.0, "min_trip_distance_m must be >= 0"),
            (c.grouping_radius_m > 0.0, "grouping_radius_m must be > 0"),
            (c.max_day_gap_days > 0.0, "max_day_gap_days must be > 0"),
            (c.min_photos_per_cluster > 0, "min_photos_per_cluster must be > 0"),
            (m.merge_radius_m >= 0.0, "merge_radius_m must be >= 0"),
            (m.max_merge_day_gap_days >= 0.0, "max_merge_day_gap_days must be >= 0"),
            (g.max_attempts > 0, "max_attempts must be > 0"),
            (g.rate_limit_quota > 0, "rate_limit_quota must be > 0"),
            (g.rate_limit_window_ms > 0, "rate_limit_window_ms must be > 0"),
            (g.request_timeout_ms > 0, "request_timeout_ms must be > 0"),
            (g.cache_precision <= 6, "cache_precision must be <= 6"),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(Error::InvalidConfig(message.to_string())),
            None => Ok(()),
        }
    }
}

fn days_to_duration(days: f64) -> chrono::Duration {
    chrono::Duration::milliseconds((days * SECONDS_PER_DAY * 1000.0).round() as i64)
}
