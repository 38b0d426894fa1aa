mod commands;
mod error;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tripmemo_core::config::OrganizerConfig;

use store::Store;

const USER_AGENT: &str = concat!("tripmemo/", env!("CARGO_PKG_VERSION"));

/// TripMemo: turn geotagged photos into trips
#[derive(Parser)]
#[command(name = "tripmemo", version, about)]
struct Cli {
    /// Path to the trip database
    #[arg(long, default_value_t = default_db_path())]
    db: String,

    /// Organizer settings as JSON (thresholds, geocoding limits)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the home location used to tell trips from everyday photos
    Home {
        #[command(subcommand)]
        action: HomeAction,
    },
    /// Group photos into trips, replacing the stored trips
    Organize {
        /// JSON array of photos: [{"id", "taken_at", "location": {"latitude", "longitude"}}]
        #[arg(long)]
        photos: PathBuf,
        /// User-Agent sent to the geocoding server
        #[arg(long, default_value = USER_AGENT)]
        user_agent: String,
        /// Preferred language for place names
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// List trips, or show details of a specific trip
    Trips {
        /// Trip ID or unique prefix (omit to list all)
        id: Option<String>,
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
    },
    /// Toggle a trip's favorite flag
    Favorite { id: String },
    /// Set a custom title (empty string restores the generated one)
    Rename { id: String, title: String },
    /// Set a trip's category
    Category { id: String, label: String },
    /// Set or clear a trip's notes
    Notes {
        id: String,
        /// Omit to clear
        text: Option<String>,
    },
    /// Retry geocoding for trips named "Unknown Location"
    Refresh {
        #[arg(long, default_value = USER_AGENT)]
        user_agent: String,
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// Show trip statistics
    Stats {
        /// Number of top destinations to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Inspect or manage the geocode cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Write all trips to a JSON file
    Export { path: PathBuf },
    /// Replace the stored trips with those from an exported JSON file
    Import { path: PathBuf },
}

#[derive(Subcommand)]
enum HomeAction {
    /// Set the home location
    Set {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        /// Home country, as the geocoder names it (e.g. "Germany")
        #[arg(long)]
        country: Option<String>,
    },
    /// Show the home location
    Show,
    /// Remove the home location
    Clear,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache size and entries
    Show,
    /// Write the cache to a JSON file
    Export { path: PathBuf },
    /// Merge entries from a JSON file into the cache
    Import { path: PathBuf },
    /// Empty the cache
    Clear,
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".tripmemo")
        .join("trips.db")
        .to_string_lossy()
        .to_string()
}

fn load_config(path: Option<&PathBuf>) -> Result<OrganizerConfig> {
    let Some(path) = path else {
        return Ok(OrganizerConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = OrganizerConfig::from_json(&json)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let mut store = Store::open(&PathBuf::from(&cli.db))
        .with_context(|| format!("opening database {}", cli.db))?;

    match cli.command {
        Commands::Home { action } => match action {
            HomeAction::Set {
                latitude,
                longitude,
                country,
            } => commands::home::set(&mut store, latitude, longitude, country)?,
            HomeAction::Show => commands::home::show(&store)?,
            HomeAction::Clear => commands::home::clear(&store)?,
        },
        Commands::Organize {
            photos,
            user_agent,
            language,
        } => commands::organize::run(&mut store, config, &photos, &user_agent, &language).await?,
        Commands::Trips { id, favorites } => match id {
            Some(id) => commands::trips::show(&store, &id)?,
            None => commands::trips::list(&store, favorites)?,
        },
        Commands::Favorite { id } => commands::trips::favorite(&store, &id)?,
        Commands::Rename { id, title } => commands::trips::rename(&store, &id, &title)?,
        Commands::Category { id, label } => commands::trips::category(&store, &id, &label)?,
        Commands::Notes { id, text } => commands::trips::notes(&store, &id, text)?,
        Commands::Refresh {
            user_agent,
            language,
        } => commands::refresh::run(&mut store, config, &user_agent, &language).await?,
        Commands::Stats { top } => commands::stats::run(&store, top)?,
        Commands::Cache { action } => match action {
            CacheAction::Show => commands::cache::show(&store)?,
            CacheAction::Export { path } => commands::cache::export(&store, &path)?,
            CacheAction::Import { path } => commands::cache::import(&mut store, &config, &path)?,
            CacheAction::Clear => commands::cache::clear(&store)?,
        },
        Commands::Export { path } => commands::export::export(&store, &path)?,
        Commands::Import { path } => commands::export::import(&mut store, &path)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_defaults_without_file() {
        assert_eq!(load_config(None).unwrap(), OrganizerConfig::default());
    }

    #[test]
    fn test_load_config_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"geocode": {"max_attempts": 5}}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.geocode.max_attempts, 5);
        assert_eq!(config.clustering, OrganizerConfig::default().clustering);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"geocode": {"rate_limit_quota": 0}}"#).unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("rate_limit_quota"));
    }
}
