//! Groups geotagged photos into trips: time-contiguous, spatially clustered
//! runs of photos taken away from home, each named through a cached,
//! rate-limited reverse geocoder.

pub mod category;
pub mod clustering;
pub mod config;
pub mod domain;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod stats;
pub mod title;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use clustering::{build_clusters, merge_clusters, PhotoCluster};
use config::{NoHomePolicy, OrganizerConfig};
use domain::*;
use error::{Error, Result};
use geocode::cache::{CachedPlace, GeocodeCache};
use geocode::{GeocodeResolver, ResolverStats, ReverseGeocoder};
use title::TitleGenerator;

/// Cooperative cancellation flag, checked between clusters.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress events emitted while organizing.
#[derive(Debug, Clone, PartialEq)]
pub enum OrganizeProgress {
    /// Clustering finished; geocoding is about to start.
    Clustered {
        /// Photos across the merged clusters, i.e. the ones that will end up in trips.
        clustered_photos: usize,
        raw_clusters: usize,
        merged_clusters: usize,
    },
    /// A cluster is about to be geocoded.
    ClusterStart { index: usize, total: usize },
    /// A trip was built for the cluster.
    TripAssembled { index: usize, title: String, resolved: bool },
    /// Every cluster has been turned into a trip.
    Complete { trips: usize, unresolved: usize },
}

/// Result of a finished organize run.
#[derive(Debug, Clone)]
pub struct OrganizeReport {
    /// Trips sorted newest first.
    pub trips: Vec<Trip>,
    /// Trips left at "Unknown Location".
    pub unresolved: usize,
    pub raw_clusters: usize,
    pub merged_clusters: usize,
    pub geocode_stats: ResolverStats,
}

/// Runs the whole pipeline: cluster, merge, then name and assemble trips.
///
/// Owns the geocode resolver (and with it the cache and rate limiter), so keep
/// one `Organizer` around across runs to reuse the cache.
pub struct Organizer<G> {
    config: OrganizerConfig,
    resolver: GeocodeResolver<G>,
    titles: TitleGenerator,
}

impl<G: ReverseGeocoder> Organizer<G> {
    pub fn new(provider: G, config: OrganizerConfig) -> Result<Self> {
        Self::with_cache(provider, config, HashMap::new())
    }

    /// Start with previously persisted geocode cache entries.
    pub fn with_cache(
        provider: G,
        config: OrganizerConfig,
        entries: HashMap<String, CachedPlace>,
    ) -> Result<Self> {
        config.validate()?;
        let cache = GeocodeCache::with_entries(entries, config.geocode.cache_precision);
        let resolver = GeocodeResolver::with_cache(provider, config.geocode.clone(), cache);
        Ok(Self {
            config,
            resolver,
            titles: TitleGenerator::default(),
        })
    }

    pub fn with_titles(mut self, titles: TitleGenerator) -> Self {
        self.titles = titles;
        self
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &GeocodeResolver<G> {
        &self.resolver
    }

    /// Current geocode cache, for the caller to persist.
    pub fn cache(&self) -> &GeocodeCache {
        self.resolver.cache()
    }

    pub fn reset_rate_window(&mut self) {
        self.resolver.reset_rate_window();
    }

    /// Build and merge clusters without geocoding.
    pub fn cluster(&self, photos: &[Photo], home: Option<&HomeLocation>) -> (usize, Vec<PhotoCluster>) {
        if home.is_none() && self.config.no_home_policy == NoHomePolicy::NoTrips {
            info!("no home location configured, skipping clustering");
            return (0, Vec::new());
        }
        if home.is_none() {
            warn!("no home location configured, clustering every geolocated photo");
        }

        let raw = build_clusters(
            photos,
            home.map(|h| &h.coordinate),
            &self.config.clustering,
        );
        let raw_count = raw.len();
        (raw_count, merge_clusters(raw, &self.config.merge))
    }

    /// Group photos into trips.
    ///
    /// Clusters are geocoded one at a time, in cluster order. A cluster whose
    /// name cannot be resolved still yields a trip, named "Unknown Location".
    /// Returns [`Error::Cancelled`] if `cancel` fires before the last cluster.
    pub async fn organize(
        &mut self,
        photos: &[Photo],
        home: Option<&HomeLocation>,
        cancel: &CancellationToken,
        mut progress: Option<&mut dyn FnMut(OrganizeProgress)>,
    ) -> Result<OrganizeReport> {
        info!(photos = photos.len(), "organizing photos into trips");
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let (raw_clusters, clusters) = self.cluster(photos, home);
        emit(
            &mut progress,
            OrganizeProgress::Clustered {
                clustered_photos: clusters.iter().map(Vec::len).sum(),
                raw_clusters,
                merged_clusters: clusters.len(),
            },
        );
        info!(raw = raw_clusters, merged = clusters.len(), "clustering complete");

        let home_country = home.and_then(|h| h.country.as_deref());
        let total = clusters.len();
        let mut trips = Vec::with_capacity(total);
        let mut unresolved = 0usize;

        for (index, cluster) in clusters.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(done = index, total, "organize cancelled");
                return Err(Error::Cancelled);
            }
            emit(&mut progress, OrganizeProgress::ClusterStart { index, total });

            let Some(trip) = self.assemble_trip(cluster, home_country).await else {
                continue;
            };
            let resolved = !trip.is_unresolved();
            if !resolved {
                unresolved += 1;
                warn!(photos = trip.photo_count(), "trip left without a place name");
            }
            emit(
                &mut progress,
                OrganizeProgress::TripAssembled {
                    index,
                    title: trip.title.clone(),
                    resolved,
                },
            );
            trips.push(trip);
        }

        trips.sort_by(|a, b| b.start_date.cmp(&a.start_date));

        emit(
            &mut progress,
            OrganizeProgress::Complete {
                trips: trips.len(),
                unresolved,
            },
        );
        info!(trips = trips.len(), unresolved, "organize complete");

        Ok(OrganizeReport {
            trips,
            unresolved,
            raw_clusters,
            merged_clusters: total,
            geocode_stats: self.resolver.stats(),
        })
    }

    async fn assemble_trip(&mut self, cluster: &PhotoCluster, home_country: Option<&str>) -> Option<Trip> {
        let first = cluster.first()?;
        let last = cluster.last()?;
        let centroid = geo::centroid(cluster);

        let location_name = match centroid {
            Some(c) => self.resolver.resolve(c, home_country).await.name,
            None => UNKNOWN_LOCATION.to_string(),
        };

        let days = duration_days(first.taken_at, last.taken_at);
        Some(Trip {
            id: Uuid::new_v4(),
            title: self.titles.title(&location_name, first.taken_at),
            custom_title: None,
            start_date: first.taken_at,
            end_date: last.taken_at,
            category: category::classify(&location_name, days),
            location_name,
            centroid,
            photo_ids: cluster.iter().map(|p| p.id.clone()).collect(),
            cover_photo_id: Some(first.id.clone()),
            is_favorite: false,
            notes: None,
        })
    }

    /// Retry geocoding for trips stuck at "Unknown Location".
    ///
    /// Only `location_name` and the generated `title` change; user-owned
    /// fields are left alone. Returns how many trips were fixed.
    pub async fn refresh_unknown(
        &mut self,
        trips: &mut [Trip],
        home_country: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let mut fixed = 0;
        for trip in trips.iter_mut().filter(|t| t.is_unresolved()) {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let Some(centroid) = trip.centroid else {
                continue;
            };
            let resolution = self.resolver.refresh(centroid, home_country).await;
            if resolution.is_resolved() {
                trip.title = self.titles.title(&resolution.name, trip.start_date);
                trip.location_name = resolution.name;
                fixed += 1;
            }
        }
        info!(fixed, "refreshed unresolved trips");
        Ok(fixed)
    }
}

fn emit(progress: &mut Option<&mut dyn FnMut(OrganizeProgress)>, event: OrganizeProgress) {
    if let Some(cb) = progress {
        cb(event);
    }
}
