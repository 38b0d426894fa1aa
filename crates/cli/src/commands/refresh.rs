use std::collections::HashSet;

use anyhow::Result;
use tripmemo_core::config::OrganizerConfig;
use tripmemo_core::error::Error as CoreError;
use tripmemo_core::CancellationToken;
use uuid::Uuid;

use super::{organize::cancel_on_ctrl_c, nominatim_organizer};
use crate::store::Store;

pub async fn run(store: &mut Store, config: OrganizerConfig, user_agent: &str, language: &str) -> Result<()> {
    let mut trips = store.list_trips()?;
    let unresolved: HashSet<Uuid> = trips.iter().filter(|t| t.is_unresolved()).map(|t| t.id).collect();
    let pending = unresolved.len();
    if pending == 0 {
        println!("Every trip already has a place name.");
        return Ok(());
    }
    println!("Retrying {pending} unnamed trips...");

    let home_country = store.home()?.and_then(|h| h.country);
    let cache = store.load_geocode_cache()?;
    let mut organizer = nominatim_organizer(config, cache, user_agent, language)?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let result = organizer
        .refresh_unknown(&mut trips, home_country.as_deref(), &cancel)
        .await;
    store.save_geocode_cache(organizer.cache().entries())?;

    // Write back whatever got fixed, even when cancelled part way.
    for trip in trips
        .iter()
        .filter(|t| unresolved.contains(&t.id) && !t.is_unresolved())
    {
        store.update_trip(trip)?;
    }

    match result {
        Ok(fixed) => println!("Named {fixed} of {pending} trips."),
        Err(CoreError::Cancelled) => println!("Cancelled."),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
