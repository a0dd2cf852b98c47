//! Coordinate fallback for airports and train stations the model named without coordinates.

pub mod data;

use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::types::{Coordinates, DayPlan};
use data::TRANSPORT_HUBS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HubCategory {
    Airport,
    TrainStation,
}

/// A gazetteer entry. Coordinates are `(lng, lat)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransportHub {
    pub name: &'static str,
    /// IATA code for airports; matched exactly, never as a substring
    pub code: Option<&'static str>,
    pub city: &'static str,
    pub category: HubCategory,
    pub coordinates: Coordinates,
    pub aliases: &'static [&'static str],
}

impl TransportHub {
    /// Canonical name followed by aliases, lowercased.
    fn match_keys(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .map(str::to_lowercase)
    }
}

/// Lookup tables over [`TRANSPORT_HUBS`], built once per process.
pub struct HubIndex {
    hubs: &'static [TransportHub],
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    // Lowercased match keys per hub, in declaration order, for the substring tier.
    keys: Vec<Vec<String>>,
}

impl HubIndex {
    pub fn global() -> &'static HubIndex {
        static INDEX: OnceLock<HubIndex> = OnceLock::new();
        INDEX.get_or_init(|| HubIndex::build(TRANSPORT_HUBS))
    }

    fn build(hubs: &'static [TransportHub]) -> Self {
        let mut by_name = HashMap::with_capacity(hubs.len());
        let mut by_alias = HashMap::new();
        let mut keys = Vec::with_capacity(hubs.len());

        for (idx, hub) in hubs.iter().enumerate() {
            by_name.entry(hub.name.to_lowercase()).or_insert(idx);
            for alias in hub.aliases.iter().copied().chain(hub.code) {
                by_alias.entry(alias.to_lowercase()).or_insert(idx);
            }
            keys.push(hub.match_keys().collect());
        }

        Self {
            hubs,
            by_name,
            by_alias,
            keys,
        }
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    /// Exact canonical name, then exact alias or code, then substring in either direction.
    pub fn resolve(&self, query: &str) -> Option<&'static TransportHub> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }

        // 1. Exact canonical name
        if let Some(&idx) = self.by_name.get(&q) {
            return Some(&self.hubs[idx]);
        }
        // 2. Exact alias or code
        if let Some(&idx) = self.by_alias.get(&q) {
            return Some(&self.hubs[idx]);
        }
        // 3. Substring either way, first hub in declaration order wins
        let hit = self.keys.iter().position(|hub_keys| {
            hub_keys
                .iter()
                .any(|key| key.contains(&q) || q.contains(key.as_str()))
        });
        if let Some(idx) = hit {
            debug!(target: "tripagent::geo", query, hub = self.hubs[idx].name, "fuzzy hub match");
            return Some(&self.hubs[idx]);
        }

        info!(target: "tripagent::geo", query, "no transport hub matches");
        None
    }

    pub fn hubs_in_city(&self, city: &str) -> Vec<&'static TransportHub> {
        let city = city.trim();
        if city.is_empty() {
            return Vec::new();
        }
        self.hubs.iter().filter(|hub| hub.city == city).collect()
    }
}

pub fn resolve_hub(name: &str) -> Option<&'static TransportHub> {
    HubIndex::global().resolve(name)
}

/// `(lng, lat)` of the hub `name` refers to, if any.
pub fn resolve_coordinates(name: &str) -> Option<Coordinates> {
    resolve_hub(name).map(|hub| hub.coordinates)
}

/// Airports and stations in `city` (exact city name, e.g. `"上海"`).
pub fn hubs_in_city(city: &str) -> Vec<&'static TransportHub> {
    HubIndex::global().hubs_in_city(city)
}

/// Fill missing endpoint coordinates of inter-city legs from the hub gazetteer.
///
/// Returns how many coordinates were filled. Coordinates the model supplied are kept.
pub fn fill_transport_coordinates(itinerary: &mut [DayPlan]) -> usize {
    let mut filled = 0;
    for leg in itinerary
        .iter_mut()
        .filter_map(|day| day.transport.as_mut())
        .flatten()
    {
        if leg.from_coordinates.is_none() {
            leg.from_coordinates = resolve_coordinates(&leg.from);
            filled += usize::from(leg.from_coordinates.is_some());
        }
        if leg.to_coordinates.is_none() {
            leg.to_coordinates = resolve_coordinates(&leg.to);
            filled += usize::from(leg.to_coordinates.is_some());
        }
    }
    filled
}
