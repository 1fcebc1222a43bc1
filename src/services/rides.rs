// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ride source consumed by the aggregation engine.
//!
//! The engine only needs to enumerate the rides of every open athlete;
//! `RideLibrary` is an in-memory implementation that can be seeded from a
//! JSON file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::models::{KnownTags, RideRecord};
use crate::sync;

/// Read access to the rides of all open athlete profiles.
pub trait RideSource: Send + Sync {
    /// Display names of the athletes currently open.
    fn athletes(&self) -> Vec<String>;

    /// Every ride of one athlete, planned rides included.
    fn rides_for(&self, athlete: &str) -> Vec<Arc<RideRecord>>;

    /// Every tag used on any ride, for validating window and filter tags.
    fn known_tags(&self) -> KnownTags {
        let mut known = KnownTags::default();
        for athlete in self.athletes() {
            for ride in self.rides_for(&athlete) {
                known.insert_csv(&ride.equipment_tags);
            }
        }
        known
    }
}

/// Flatten the non-planned rides of every open athlete into one list.
pub fn collect_rides(source: &dyn RideSource) -> Vec<Arc<RideRecord>> {
    source
        .athletes()
        .iter()
        .flat_map(|athlete| source.rides_for(athlete))
        .filter(|ride| !ride.planned)
        .collect()
}

/// On-disk layout of a ride file: athlete name to ride list.
#[derive(Debug, Deserialize)]
struct RideFile {
    athletes: BTreeMap<String, Vec<RideRecord>>,
}

/// In-memory ride cache keyed by athlete.
#[derive(Default)]
pub struct RideLibrary {
    athletes: RwLock<BTreeMap<String, Vec<Arc<RideRecord>>>>,
}

impl RideLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rides from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RideLibraryError> {
        let json_data = fs::read_to_string(path.as_ref())
            .map_err(|e| RideLibraryError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load rides from a JSON string.
    ///
    /// Each ride's athlete name is taken from the profile it is listed under.
    pub fn load_from_json(json_data: &str) -> Result<Self, RideLibraryError> {
        let file: RideFile = serde_json::from_str(json_data)
            .map_err(|e| RideLibraryError::ParseError(e.to_string()))?;

        let library = Self::new();
        for (athlete, rides) in file.athletes {
            library.open_athlete(&athlete);
            for mut ride in rides {
                ride.athlete = athlete.clone();
                library.add_ride(ride);
            }
        }

        tracing::info!(
            athletes = library.athletes().len(),
            rides = library.ride_count(),
            "Loaded rides"
        );
        Ok(library)
    }

    pub fn open_athlete(&self, athlete: &str) {
        sync::write(&self.athletes)
            .entry(athlete.to_string())
            .or_default();
    }

    /// Close a profile; its rides stop counting towards equipment usage.
    pub fn close_athlete(&self, athlete: &str) -> bool {
        sync::write(&self.athletes).remove(athlete).is_some()
    }

    /// Add a ride to its athlete's profile, opening the profile if needed.
    pub fn add_ride(&self, ride: RideRecord) -> Arc<RideRecord> {
        let ride = Arc::new(ride);
        sync::write(&self.athletes)
            .entry(ride.athlete.clone())
            .or_default()
            .push(Arc::clone(&ride));
        ride
    }

    /// Remove the rides of `athlete` matching `predicate`. Returns how many.
    pub fn remove_rides(&self, athlete: &str, predicate: impl Fn(&RideRecord) -> bool) -> usize {
        let mut athletes = sync::write(&self.athletes);
        let Some(rides) = athletes.get_mut(athlete) else {
            return 0;
        };
        let before = rides.len();
        rides.retain(|r| !predicate(r));
        before - rides.len()
    }

    /// Swap the first ride of `ride.athlete` matching `predicate` for `ride`.
    /// Returns false, leaving the library unchanged, if none matches.
    pub fn replace_ride(&self, ride: RideRecord, predicate: impl Fn(&RideRecord) -> bool) -> bool {
        let mut athletes = sync::write(&self.athletes);
        let Some(slot) = athletes
            .get_mut(&ride.athlete)
            .and_then(|rides| rides.iter_mut().find(|r| predicate(r)))
        else {
            return false;
        };
        *slot = Arc::new(ride);
        true
    }

    pub fn ride_count(&self) -> usize {
        sync::read(&self.athletes).values().map(Vec::len).sum()
    }
}

impl RideSource for RideLibrary {
    fn athletes(&self) -> Vec<String> {
        sync::read(&self.athletes).keys().cloned().collect()
    }

    fn rides_for(&self, athlete: &str) -> Vec<Arc<RideRecord>> {
        sync::read(&self.athletes)
            .get(athlete)
            .cloned()
            .unwrap_or_default()
    }
}

/// Errors from ride loading.
#[derive(Debug, thiserror::Error)]
pub enum RideLibraryError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse rides: {0}")]
    ParseError(String),
}
