pub mod cache;
pub mod naming;
#[cfg(feature = "nominatim")]
pub mod nominatim;
pub mod rate_limit;

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GeocodeConfig;
use crate::domain::{Coordinate, UNKNOWN_LOCATION};
use crate::error::{Error, Result};
use cache::{CachedPlace, GeocodeCache};
use naming::{display_name, UNKNOWN_COUNTRY};
use rate_limit::RateLimiter;

/// The address fields a reverse-geocoding provider reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placemark {
    pub locality: Option<String>,
    pub sub_locality: Option<String>,
    pub administrative_area: Option<String>,
    pub country: Option<String>,
}

impl Placemark {
    /// City from the most specific populated field, paired with the country.
    pub fn to_place(&self) -> Result<CachedPlace> {
        let non_empty = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let country = non_empty(&self.country);
        let city = non_empty(&self.locality)
            .or_else(|| non_empty(&self.sub_locality))
            .or_else(|| non_empty(&self.administrative_area))
            .or_else(|| country.clone())
            .ok_or(Error::EmptyPlacemark)?;

        Ok(CachedPlace::new(
            city,
            country.unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
        ))
    }
}

/// A reverse-geocoding backend.
///
/// Implementations issue exactly one request per call. Throttling responses
/// should be reported as [`Error::RateLimited`] so the resolver waits instead
/// of burning attempts (up to `max_throttle_waits` times per lookup).
pub trait ReverseGeocoder {
    fn reverse_geocode(&self, coordinate: Coordinate) -> impl Future<Output = Result<Placemark>> + Send;
}

/// Where a resolved name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Cache,
    Network,
    /// All attempts failed; the name is [`UNKNOWN_LOCATION`].
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub name: String,
    pub country: Option<String>,
    pub source: ResolutionSource,
}

impl Resolution {
    fn unknown() -> Self {
        Self {
            name: UNKNOWN_LOCATION.to_string(),
            country: None,
            source: ResolutionSource::Fallback,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.source != ResolutionSource::Fallback
    }
}

/// Counters for one resolver's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub cache_hits: usize,
    pub requests: usize,
    pub failures: usize,
}

/// Resolves coordinates to display names through a cache, a fixed-window
/// rate limiter, a per-request timeout and a bounded retry loop.
///
/// Not meant to be shared between concurrent tasks: the cache and the
/// limiter are plain owned state, so calls must be serialized.
pub struct GeocodeResolver<G> {
    provider: G,
    cache: GeocodeCache,
    limiter: RateLimiter,
    config: GeocodeConfig,
    stats: ResolverStats,
}

impl<G: ReverseGeocoder> GeocodeResolver<G> {
    pub fn new(provider: G, config: GeocodeConfig) -> Self {
        let cache = GeocodeCache::new(config.cache_precision);
        Self::with_cache(provider, config, cache)
    }

    /// Start from a pre-populated cache, e.g. one loaded from disk.
    pub fn with_cache(provider: G, config: GeocodeConfig, cache: GeocodeCache) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_quota, config.rate_limit_window());
        Self {
            provider,
            cache,
            limiter,
            config,
            stats: ResolverStats::default(),
        }
    }

    /// Resolve a coordinate to a display name. Never fails: when every attempt
    /// fails the name is [`UNKNOWN_LOCATION`] and nothing is cached.
    pub async fn resolve(&mut self, coordinate: Coordinate, home_country: Option<&str>) -> Resolution {
        if !coordinate.is_valid() {
            warn!(?coordinate, "refusing to geocode invalid coordinate");
            return Resolution::unknown();
        }

        if let Some(place) = self.cache.get(&coordinate) {
            self.stats.cache_hits += 1;
            debug!(key = %self.cache.key_for(&coordinate), "geocode cache hit");
            return Resolution {
                name: display_name(place, home_country, &self.config),
                country: Some(place.country.clone()),
                source: ResolutionSource::Cache,
            };
        }

        match self.fetch_place(coordinate).await {
            Some(place) => {
                let name = display_name(&place, home_country, &self.config);
                debug!(%name, city = %place.city, country = %place.country, "geocoded");
                let country = Some(place.country.clone());
                self.cache.insert(&coordinate, place);
                Resolution {
                    name,
                    country,
                    source: ResolutionSource::Network,
                }
            }
            None => {
                self.stats.failures += 1;
                warn!(?coordinate, "geocoding exhausted all attempts");
                Resolution::unknown()
            }
        }
    }

    /// Drop the cached entry for this coordinate's bucket and resolve again.
    pub async fn refresh(&mut self, coordinate: Coordinate, home_country: Option<&str>) -> Resolution {
        self.cache.remove(&coordinate);
        self.resolve(coordinate, home_country).await
    }

    async fn fetch_place(&mut self, coordinate: Coordinate) -> Option<CachedPlace> {
        let timeout = self.config.request_timeout();
        let max_attempts = self.config.max_attempts;
        let max_throttle_waits = self.config.max_throttle_waits;
        let mut attempt = 0u32;
        let mut throttled = 0u32;

        loop {
            self.limiter.acquire().await;
            self.stats.requests += 1;

            let outcome = match tokio::time::timeout(timeout, self.provider.reverse_geocode(coordinate)).await {
                Ok(result) => result.and_then(|placemark| placemark.to_place()),
                Err(_) => Err(Error::Timeout(timeout)),
            };

            let err = match outcome {
                Ok(place) => return Some(place),
                Err(err) => err,
            };

            // Throttling is waited out, not counted against max_attempts.
            if let Error::RateLimited { retry_after } = err {
                throttled += 1;
                if throttled > max_throttle_waits {
                    warn!(throttled, "provider kept throttling, giving up");
                    return None;
                }
                debug!(throttled, ?retry_after, "provider throttled request, waiting");
                match retry_after {
                    Some(after) => tokio::time::sleep(after).await,
                    None => self.limiter.saturate(),
                }
                continue;
            }

            attempt += 1;
            warn!(attempt, max_attempts, error = %err, "geocoding attempt failed");
            if attempt >= max_attempts {
                return None;
            }
            tokio::time::sleep(self.config.retry_delay(attempt)).await;
        }
    }

    /// Start a fresh rate-limit window, for a run that should not inherit the last one's quota use.
    pub fn reset_rate_window(&mut self) {
        self.limiter.reset();
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    pub fn into_cache(self) -> GeocodeCache {
        self.cache
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    pub fn config(&self) -> &GeocodeConfig {
        &self.config
    }
}
