use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tripmemo_core::stats::TripStats;

use crate::store::Store;

pub fn run(store: &Store, top: usize) -> Result<()> {
    let trips = store.list_trips()?;
    if trips.is_empty() {
        println!("No trips yet.");
        return Ok(());
    }
    let stats = TripStats::compute(&trips, top);

    println!();
    println!("  Trip Stats");
    println!("  ====================");
    println!();
    println!("  Trips:           {}", stats.total_trips);
    println!("  Photos:          {}", stats.total_photos);
    println!("  Days traveled:   {}", stats.total_days);
    println!("  Places visited:  {}", stats.unique_locations);
    println!();
    println!("{}", years_table(&stats));
    println!();
    println!("{}", destinations_table(&stats));
    Ok(())
}

fn years_table(stats: &TripStats) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Year"), Cell::new("Trips")]);
    for (year, count) in &stats.trips_by_year {
        table.add_row(vec![Cell::new(year), Cell::new(count)]);
    }
    table
}

fn destinations_table(stats: &TripStats) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Top destination"), Cell::new("Trips")]);
    for (name, count) in &stats.top_destinations {
        table.add_row(vec![Cell::new(name), Cell::new(count)]);
    }
    table
}
