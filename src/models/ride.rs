// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ride record consumed by the aggregation engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::usage_window::parse_tag_csv;
use crate::units::Units;

/// One completed (or planned) exercise session.
///
/// Values are stored metric; the engine converts them to the display units
/// when a pass starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRecord {
    /// Activity start date
    pub start_date: NaiveDate,
    /// Distance in kilometres
    #[serde(default)]
    pub distance_km: f64,
    /// Elevation gain in metres
    #[serde(default)]
    pub elevation_gain_m: f64,
    /// Time spent moving, in seconds
    #[serde(default)]
    pub time_ridden_secs: u64,
    /// Comma-joined equipment tags (e.g. "bike1, chain3")
    #[serde(default)]
    pub equipment_tags: String,
    /// Owning athlete's display name
    #[serde(default)]
    pub athlete: String,
    /// Planned/future workouts never count towards equipment usage
    #[serde(default)]
    pub planned: bool,
}

impl RideRecord {
    /// Build the engine's view of this ride in the given display units.
    pub fn sample(&self, units: Units) -> RideSample {
        RideSample {
            tags: parse_tag_csv(&self.equipment_tags),
            date: self.start_date,
            distance: units.distance_from_km(self.distance_km),
            elevation: units.elevation_from_meters(self.elevation_gain_m),
            time_secs: self.time_ridden_secs,
            athlete: self.athlete.clone(),
        }
    }
}

/// A ride with tags parsed and values converted, ready to offer to records.
#[derive(Debug, Clone, PartialEq)]
pub struct RideSample {
    pub tags: Vec<String>,
    pub date: NaiveDate,
    pub distance: f64,
    pub elevation: f64,
    pub time_secs: u64,
    pub athlete: String,
}
