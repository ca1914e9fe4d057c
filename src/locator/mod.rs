//! Pharmacy location helpers.
//!
//! Geocoding and nearby search go over HTTP (see [`client`]); distance, map
//! links, and matching inventory owners to map listings are local.

pub mod client;

use serde::{Deserialize, Serialize};

pub use client::LocatorClient;

/// Mean Earth radius (IUGG), in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0088;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `"lat,lon"`, the form the places API expects.
    pub fn as_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// A pharmacy listing from the places API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pharmacy {
    pub name: String,
    pub address: String,
    pub location: Coordinates,
}

impl Pharmacy {
    pub fn maps_link(&self) -> String {
        maps_link(&self.name, &self.address)
    }
}

/// Great-circle distance in kilometres (haversine).
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Google Maps search URL for a place.
pub fn maps_link(name: &str, address: &str) -> String {
    format!(
        "https://www.google.com/maps/search/{}+{}",
        name.replace(' ', "+"),
        address.replace(' ', "+")
    )
}

/// Similarity of two names on a 0-100 scale.
///
/// Case and punctuation are ignored; the score is the normalized Levenshtein
/// similarity of what remains.
pub fn name_ratio(a: &str, b: &str) -> f64 {
    let (a, b) = (simplify(a), simplify(b));
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    (strsim::normalized_levenshtein(&a, &b) * 100.0).round()
}

fn simplify(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best candidate whose [`name_ratio`] with `name` reaches `cutoff`. The first
/// candidate wins ties.
pub fn match_pharmacy<'a>(name: &str, candidates: &'a [Pharmacy], cutoff: f64) -> Option<&'a Pharmacy> {
    let mut best: Option<(&Pharmacy, f64)> = None;
    for candidate in candidates {
        let score = name_ratio(name, &candidate.name);
        if score < cutoff {
            continue;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.map(|(p, _)| p)
}
