//! CLI `pharmacies` command: nearby pharmacies, optionally with who stocks a
//! medicine.

use anyhow::{Context, Result};

use crate::config::MedwiseConfig;
use crate::inventory;
use crate::locator::{distance_km, Coordinates, LocatorClient, Pharmacy};
use crate::medicines::{self, locate_stockists, SearchState, StockistLocation};

pub async fn pharmacies(config: &MedwiseConfig, place: &str, medicine: Option<&str>) -> Result<()> {
    let client = LocatorClient::new(config.locator.clone())?;

    let Some(origin) = client.geocode(place).await? else {
        println!("Place not found: {place}");
        return Ok(());
    };
    println!("{place}: {:.5}, {:.5}", origin.latitude, origin.longitude);

    let nearby = client.nearby_pharmacies(origin).await?;
    if nearby.is_empty() {
        println!("No pharmacies found nearby.");
    } else {
        println!("{} pharmacies found:\n", nearby.len());
        print_pharmacies(&nearby, origin);
    }

    if let Some(query) = medicine {
        println!();
        stock_report(config, query, &nearby, origin, client.match_cutoff()).await?;
    }
    Ok(())
}

fn print_pharmacies(nearby: &[Pharmacy], origin: Coordinates) {
    for pharmacy in nearby {
        println!(
            "  {} ({:.2} km)\n     {}\n     {}",
            pharmacy.name,
            distance_km(origin, pharmacy.location),
            pharmacy.address,
            pharmacy.maps_link()
        );
    }
}

async fn stock_report(
    config: &MedwiseConfig,
    query: &str,
    nearby: &[Pharmacy],
    origin: Coordinates,
    cutoff: f64,
) -> Result<()> {
    let search = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || medicines::load_search(&config)).await?
    };
    let index = match search {
        SearchState::Ready(index) => index,
        SearchState::Unavailable { reason } => {
            println!("Medicine search unavailable: {reason}");
            return Ok(());
        }
    };

    let matches = medicines::search_blocking(index, query, config.matcher.top_n).await?;
    let conn = crate::db::open_database(config.resolved_db_path())
        .context("failed to open database")?;

    for m in matches {
        println!("{} (similarity {:.2})", m.name, m.score);
        let names = inventory::stockist_names(&conn, &m.name)?;
        if names.is_empty() {
            println!("  No pharmacy has '{}' in inventory.", m.name);
            continue;
        }
        for stockist in locate_stockists(&names, nearby, Some(origin), cutoff) {
            match stockist {
                StockistLocation::Located {
                    pharmacy,
                    address,
                    distance_km,
                    maps_link,
                    ..
                } => {
                    let distance = distance_km.map(|d| format!(" ({d:.2} km)")).unwrap_or_default();
                    println!("  {pharmacy}{distance}: {address}\n     {maps_link}");
                }
                StockistLocation::NotMatched { pharmacy } => {
                    println!("  {pharmacy}: stock available (location not matched on map)");
                }
            }
        }
    }
    Ok(())
}
