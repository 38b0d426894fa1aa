use anyhow::{bail, Result};
use tripmemo_core::domain::{Coordinate, HomeLocation};

use crate::store::Store;

pub fn set(store: &mut Store, latitude: f64, longitude: f64, country: Option<String>) -> Result<()> {
    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        bail!("invalid coordinate: {latitude}, {longitude}");
    }
    let country = country.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    store.set_home(&HomeLocation::new(coordinate, country))?;
    println!("Home set to {}", describe(store.home()?.as_ref()));
    Ok(())
}

pub fn show(store: &Store) -> Result<()> {
    match store.home()? {
        Some(home) => println!("Home: {}", describe(Some(&home))),
        None => println!("No home location set. Use `tripmemo home set <lat> <lon>` to set one."),
    }
    Ok(())
}

pub fn clear(store: &Store) -> Result<()> {
    store.clear_home()?;
    println!("Home location cleared.");
    Ok(())
}

pub(crate) fn describe(home: Option<&HomeLocation>) -> String {
    match home {
        None => "not set".to_string(),
        Some(home) => {
            let coords = format!("{:.4}, {:.4}", home.coordinate.latitude, home.coordinate.longitude);
            match &home.country {
                Some(country) => format!("{coords} ({country})"),
                None => coords,
            }
        }
    }
}
