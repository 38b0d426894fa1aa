pub mod cache;
pub mod export;
pub mod home;
pub mod organize;
pub mod refresh;
pub mod stats;
pub mod trips;

use std::collections::HashMap;

use anyhow::Result;
use tracing::info;
use tripmemo_core::config::OrganizerConfig;
use tripmemo_core::geocode::cache::CachedPlace;
use tripmemo_core::geocode::nominatim::{apply_usage_policy, NominatimClient};
use tripmemo_core::Organizer;

/// First eight characters of a trip id, enough to address it on the command line.
pub(crate) fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// An organizer backed by Nominatim, paced to the server's usage policy.
pub(crate) fn nominatim_organizer(
    mut config: OrganizerConfig,
    cache: HashMap<String, CachedPlace>,
    user_agent: &str,
    language: &str,
) -> Result<Organizer<NominatimClient>> {
    if apply_usage_policy(&mut config.geocode) {
        info!(
            quota = config.geocode.rate_limit_quota,
            window_ms = config.geocode.rate_limit_window_ms,
            "rate limit lowered to the geocoding server's usage policy"
        );
    }
    let client = NominatimClient::new(user_agent)?.language(language);
    Ok(Organizer::with_cache(client, config, cache)?)
}
