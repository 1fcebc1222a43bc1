// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Usage summary across every ride carrying one tag (or every ride at all).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use crate::models::equipment::{Accumulate, Counter, ScaledSum};
use crate::models::ride::RideSample;
use crate::models::usage_window::{normalize_tag, KnownTags};
use crate::sync;
use crate::units::{convert_distance, convert_elevation, Units};

/// User-entered state of a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Tag filter; empty matches every ride
    #[serde(default)]
    tag: String,
    /// Break the activity count down by athlete
    #[serde(default)]
    pub show_per_athlete: bool,
    #[serde(skip)]
    tag_is_known: bool,
}

impl SummaryConfig {
    pub fn new(tag: &str, show_per_athlete: bool) -> Self {
        Self {
            tag: normalize_tag(tag),
            show_per_athlete,
            tag_is_known: false,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: &str, known: &KnownTags) {
        self.tag = normalize_tag(tag);
        self.tag_is_known = known.contains(&self.tag);
    }

    pub fn tag_is_known(&self) -> bool {
        self.tag_is_known
    }

    fn matches(&self, ride_tags: &[String]) -> bool {
        self.tag.is_empty() || ride_tags.iter().any(|t| *t == self.tag)
    }
}

/// Values computed by the last committed pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTotals {
    pub activities: u64,
    pub distance: f64,
    pub elevation: f64,
    pub time_secs: u64,
    /// Unset when no ride matched
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    pub per_athlete: BTreeMap<String, u32>,
}

/// Accumulator state that needs ordered updates.
#[derive(Debug, Default)]
struct DateSpan {
    earliest: Option<NaiveDate>,
    latest: Option<NaiveDate>,
    per_athlete: BTreeMap<String, u32>,
}

#[derive(Debug, Default)]
struct SummaryAccumulator {
    activities: Counter,
    time_secs: Counter,
    distance: ScaledSum,
    elevation: ScaledSum,
    span: Mutex<DateSpan>,
}

#[derive(Debug, Default)]
pub struct EquipmentSummary {
    config: RwLock<SummaryConfig>,
    totals: RwLock<SummaryTotals>,
    acc: SummaryAccumulator,
}

impl EquipmentSummary {
    pub fn with_config(config: SummaryConfig) -> Self {
        Self {
            config: RwLock::new(config),
            ..Self::default()
        }
    }

    pub fn config(&self) -> SummaryConfig {
        sync::read(&self.config).clone()
    }

    pub fn update<R>(&self, edit: impl FnOnce(&mut SummaryConfig) -> R) -> R {
        edit(&mut sync::write(&self.config))
    }

    pub fn totals(&self) -> SummaryTotals {
        sync::read(&self.totals).clone()
    }

    pub fn refresh_known(&self, known: &KnownTags) {
        let mut config = sync::write(&self.config);
        config.tag_is_known = known.contains(&config.tag);
    }

    pub(crate) fn duplicate(&self) -> Self {
        Self::with_config(self.config())
    }
}

impl Accumulate for EquipmentSummary {
    fn start_of_calculation(&self) {
        self.acc.activities.reset();
        self.acc.time_secs.reset();
        self.acc.distance.reset(0.0);
        self.acc.elevation.reset(0.0);
        *sync::lock(&self.acc.span) = DateSpan::default();
    }

    fn add_activity(&self, ride: &RideSample) {
        if !sync::read(&self.config).matches(&ride.tags) {
            return;
        }

        {
            let mut span = sync::lock(&self.acc.span);
            *span.per_athlete.entry(ride.athlete.clone()).or_insert(0) += 1;
            span.earliest = Some(span.earliest.map_or(ride.date, |d| d.min(ride.date)));
            span.latest = Some(span.latest.map_or(ride.date, |d| d.max(ride.date)));
        }

        self.acc.activities.add(1);
        self.acc.time_secs.add(ride.time_secs);
        self.acc.distance.add(ride.distance);
        self.acc.elevation.add(ride.elevation);
    }

    fn end_of_calculation(&self) {
        let span = std::mem::take(&mut *sync::lock(&self.acc.span));
        *sync::write(&self.totals) = SummaryTotals {
            activities: self.acc.activities.get(),
            distance: self.acc.distance.value(),
            elevation: self.acc.elevation.value(),
            time_secs: self.acc.time_secs.get(),
            earliest: span.earliest,
            latest: span.latest,
            per_athlete: span.per_athlete,
        };
    }

    fn units_changed(&self, units: Units) {
        let mut totals = sync::write(&self.totals);
        totals.distance = convert_distance(totals.distance, units);
        totals.elevation = convert_elevation(totals.elevation, units);
    }
}
