use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tripmemo_core::config::OrganizerConfig;
use tripmemo_core::domain::Photo;
use tripmemo_core::error::Error as CoreError;
use tripmemo_core::{CancellationToken, OrganizeProgress, OrganizeReport};

use super::{home::describe, nominatim_organizer};
use crate::store::Store;

pub(crate) fn parse_photos(json: &str) -> Result<Vec<Photo>> {
    let photos: Vec<Photo> = serde_json::from_str(json)?;
    Ok(photos)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

/// Cancel `token` on the first Ctrl-C.
pub(crate) fn cancel_on_ctrl_c(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling after the current place lookup...");
            token.cancel();
        }
    });
}

pub async fn run(
    store: &mut Store,
    config: OrganizerConfig,
    photos_path: &Path,
    user_agent: &str,
    language: &str,
) -> Result<()> {
    let json = std::fs::read_to_string(photos_path)
        .with_context(|| format!("reading photos {}", photos_path.display()))?;
    let photos = parse_photos(&json).with_context(|| format!("parsing photos {}", photos_path.display()))?;
    let home = store.home()?;
    if home.is_none() {
        warn!("organizing without a home location");
    }
    println!(
        "Organizing {} photos (home: {})",
        photos.len(),
        describe(home.as_ref())
    );

    let cache = store.load_geocode_cache()?;
    info!(entries = cache.len(), "loaded geocode cache");
    let mut organizer = nominatim_organizer(config, cache, user_agent, language)?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let pb = ProgressBar::new(0);
    pb.set_style(bar_style());
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = organizer
        .organize(
            &photos,
            home.as_ref(),
            &cancel,
            Some(&mut |progress| match progress {
                OrganizeProgress::Clustered {
                    clustered_photos,
                    raw_clusters,
                    merged_clusters,
                } => {
                    pb.set_length(merged_clusters as u64);
                    pb.set_position(0);
                    pb.println(format!(
                        "{clustered_photos} photos in {raw_clusters} clusters, merged into {merged_clusters}"
                    ));
                    pb.set_message("Naming trips...");
                }
                OrganizeProgress::ClusterStart { .. } => {}
                OrganizeProgress::TripAssembled { title, .. } => {
                    pb.inc(1);
                    pb.set_message(title);
                }
                OrganizeProgress::Complete { trips, unresolved } => {
                    pb.finish_with_message(format!("{trips} trips, {unresolved} unnamed"));
                }
            }),
        )
        .await;

    // Places resolved before a cancellation are still worth keeping.
    store.save_geocode_cache(organizer.cache().entries())?;

    let report = match result {
        Ok(report) => report,
        Err(CoreError::Cancelled) => {
            pb.abandon_with_message("cancelled");
            println!("Cancelled. Stored trips were left unchanged.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    store.replace_trips(&report.trips)?;
    store.set_last_organized(Utc::now())?;
    println!("{}", summary(&report));
    Ok(())
}

pub(crate) fn summary(report: &OrganizeReport) -> String {
    let mut line = format!("Found {} trips.", report.trips.len());
    if report.unresolved > 0 {
        line.push_str(&format!(
            " {} could not be named; run `tripmemo refresh` to retry.",
            report.unresolved
        ));
    }
    let stats = report.geocode_stats;
    line.push_str(&format!(
        " ({} place lookups, {} from cache)",
        stats.requests, stats.cache_hits
    ));
    line
}
