//! Reverse geocoding against an OpenStreetMap Nominatim server.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use super::{Placemark, ReverseGeocoder};
use crate::config::GeocodeConfig;
use crate::domain::Coordinate;
use crate::error::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";

/// The public server allows one request per second.
pub const POLICY_QUOTA: u32 = 1;
pub const POLICY_WINDOW_MS: u64 = 1_000;

/// Slow `config`'s limiter down to the public server's usage policy.
///
/// Settings already at or below one request per second are kept. Returns
/// whether anything changed.
pub fn apply_usage_policy(config: &mut GeocodeConfig) -> bool {
    // quota / window > POLICY_QUOTA / POLICY_WINDOW_MS, cross-multiplied
    let too_fast = u128::from(config.rate_limit_quota) * u128::from(POLICY_WINDOW_MS)
        > u128::from(POLICY_QUOTA) * u128::from(config.rate_limit_window_ms);
    if too_fast {
        config.rate_limit_quota = POLICY_QUOTA;
        config.rate_limit_window_ms = POLICY_WINDOW_MS;
    }
    too_fast
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    suburb: Option<String>,
    city_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl From<Address> for Placemark {
    fn from(a: Address) -> Self {
        Placemark {
            locality: a.city.or(a.town).or(a.village).or(a.municipality),
            sub_locality: a.suburb.or(a.city_district),
            administrative_area: a.state.or(a.county),
            country: a.country,
        }
    }
}

/// HTTP client for the Nominatim `/reverse` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    endpoint: String,
    language: String,
}

impl NominatimClient {
    /// `user_agent` must identify the application, per the Nominatim usage policy.
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_endpoint(user_agent, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(user_agent: &str, endpoint: &str) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            language: "en".to_string(),
        })
    }

    /// Preferred language for place names (an `Accept-Language` value).
    pub fn language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    async fn request(&self, coordinate: Coordinate) -> Result<Placemark> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("zoom", "10".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.language)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(Error::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(Error::Provider(format!("HTTP {status}")));
        }

        let body: ReverseResponse = response.json().await?;
        if let Some(message) = body.error {
            return Err(Error::Provider(message));
        }
        body.address
            .map(Placemark::from)
            .ok_or(Error::EmptyPlacemark)
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse_geocode(&self, coordinate: Coordinate) -> impl std::future::Future<Output = Result<Placemark>> + Send {
        self.request(coordinate)
    }
}
